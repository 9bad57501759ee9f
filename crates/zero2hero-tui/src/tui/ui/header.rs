/*
[INPUT]:  SessionState snapshot
[OUTPUT]: Header view-model (brand, balance, badge, login control) and its renderer
[POS]:    TUI UI header
[UPDATE]: When login states or header content change
*/

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use zero2hero_rewards::{AuthStatus, SessionState};

use crate::tui::runtime::{border_style, disabled_style, format_decimal, header_style, key_style};

pub const SETUP_REQUIRED_MESSAGE: &str = "Please set up a Web3Auth client ID first. Set WEB3_AUTH_CLIENT_ID or provider.client_id in the configuration.";

/// State of the login affordance, in priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginControl {
    Loading,
    Account { name: String },
    SetupRequired,
    InitFailed,
    Initializing,
    Login,
}

impl LoginControl {
    pub fn from_session(state: &SessionState) -> Self {
        if state.loading {
            return LoginControl::Loading;
        }
        if let Some(identity) = state.identity.as_ref() {
            return LoginControl::Account {
                name: identity.display_name().to_string(),
            };
        }
        if state.setup_required {
            return LoginControl::SetupRequired;
        }
        match state.status {
            AuthStatus::Failed => LoginControl::InitFailed,
            AuthStatus::Ready => LoginControl::Login,
            AuthStatus::Uninitialized | AuthStatus::Initializing => LoginControl::Initializing,
        }
    }

    pub fn label(&self) -> String {
        match self {
            LoginControl::Loading => "Loading...".to_string(),
            LoginControl::Account { name } => name.clone(),
            LoginControl::SetupRequired => "Setup Required".to_string(),
            LoginControl::InitFailed => "Initialization failed".to_string(),
            LoginControl::Initializing => "Initializing...".to_string(),
            LoginControl::Login => "Login with Web3Auth".to_string(),
        }
    }

    /// Whether pressing the associated key does anything
    pub fn enabled(&self) -> bool {
        matches!(
            self,
            LoginControl::Account { .. } | LoginControl::InitFailed | LoginControl::Login
        )
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LoginControl::Login => Some("[l] Login"),
            LoginControl::Account { .. } => Some("[o] Sign Out"),
            LoginControl::InitFailed => Some("[i] Retry Initialization"),
            LoginControl::SetupRequired => Some("set WEB3_AUTH_CLIENT_ID"),
            LoginControl::Loading | LoginControl::Initializing => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderView {
    pub balance: String,
    pub unread: usize,
    pub control: LoginControl,
}

impl HeaderView {
    pub fn from_session(state: &SessionState) -> Self {
        Self {
            balance: format_decimal(state.balance, 2),
            unread: state.notifications.len(),
            control: LoginControl::from_session(state),
        }
    }

    pub fn login_enabled(&self) -> bool {
        self.control == LoginControl::Login
    }
}

pub(in crate::tui) fn draw_header(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    view: &HeaderView,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(inner);

    let badge_style = if view.unread > 0 {
        Style::default()
            .fg(Color::LightRed)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let left = Line::from(vec![
        Span::styled(" Zero2Hero ", header_style()),
        Span::raw("  "),
        Span::styled(format!("Notifications {}", view.unread), badge_style),
        Span::raw("  "),
        Span::styled(
            format!("Balance {}", view.balance),
            Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(left), columns[0]);

    let label_style = if view.control.enabled() {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        disabled_style()
    };
    let mut right = vec![Span::styled(view.control.label(), label_style)];
    if let Some(hint) = view.control.hint() {
        right.push(Span::raw(" "));
        right.push(Span::styled(hint, key_style()));
    }
    frame.render_widget(
        Paragraph::new(Line::from(right)).alignment(ratatui::layout::Alignment::Right),
        columns[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use zero2hero_rewards::Identity;

    fn ready() -> SessionState {
        SessionState {
            status: AuthStatus::Ready,
            ..SessionState::default()
        }
    }

    #[test]
    fn test_loading_wins_and_keeps_balance_visible() {
        let state = SessionState {
            loading: true,
            balance: Decimal::from_str("12.5").unwrap(),
            identity: Some(Identity::new("a@x.com", "Ann")),
            ..ready()
        };
        let view = HeaderView::from_session(&state);
        assert_eq!(view.control, LoginControl::Loading);
        assert_eq!(view.control.label(), "Loading...");
        assert!(!view.control.enabled());
        assert_eq!(view.balance, "12.50");
    }

    #[test]
    fn test_login_disabled_until_ready() {
        let view = HeaderView::from_session(&SessionState::default());
        assert_eq!(view.control.label(), "Initializing...");
        assert!(!view.login_enabled());

        let view = HeaderView::from_session(&ready());
        assert_eq!(view.control.label(), "Login with Web3Auth");
        assert!(view.login_enabled());
    }

    #[test]
    fn test_setup_required_and_failed_states() {
        let state = SessionState {
            setup_required: true,
            ..SessionState::default()
        };
        assert_eq!(
            HeaderView::from_session(&state).control,
            LoginControl::SetupRequired
        );

        let state = SessionState {
            status: AuthStatus::Failed,
            ..SessionState::default()
        };
        let control = LoginControl::from_session(&state);
        assert_eq!(control.label(), "Initialization failed");
        assert_eq!(control.hint(), Some("[i] Retry Initialization"));
    }

    #[test]
    fn test_signed_in_shows_display_name_and_sign_out() {
        let state = SessionState {
            identity: Some(Identity {
                email: Some("anon@x.com".to_string()),
                name: None,
            }),
            ..ready()
        };
        let view = HeaderView::from_session(&state);
        assert_eq!(view.control.label(), "Anonymous User");
        assert_eq!(view.control.hint(), Some("[o] Sign Out"));
        assert!(!view.login_enabled());
    }
}
