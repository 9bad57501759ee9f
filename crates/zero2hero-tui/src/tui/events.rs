/*
[INPUT]:  Crossterm key events, AppState, client services
[OUTPUT]: Key-to-intent mapping and intent dispatch to the gateway and poller
[POS]:    TUI event routing
[UPDATE]: When adding key bindings or intents
*/

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{info, warn};

use zero2hero_rewards::RewardsError;

use super::app::{AppState, Intent};
use super::ui::{LoginControl, SETUP_REQUIRED_MESSAGE};
use crate::services::ClientServices;

/// Pure key mapping; state only decides whether digits address notifications
pub fn map_key(app: &AppState, key: KeyEvent) -> Option<Intent> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Intent::Quit);
    }

    match key.code {
        KeyCode::Char('q') => Some(Intent::Quit),
        KeyCode::Char('l') => Some(Intent::Login),
        KeyCode::Char('o') => Some(Intent::Logout),
        KeyCode::Char('u') => Some(Intent::RefreshIdentity),
        KeyCode::Char('i') => Some(Intent::RetryInit),
        KeyCode::Char('m') => Some(Intent::ToggleMenu),
        KeyCode::Char('n') => Some(Intent::ToggleNotifications),
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit as usize - '1' as usize;
            (index < app.session.notifications.len()).then_some(Intent::Dismiss(index))
        }
        KeyCode::Up => Some(Intent::MoveNav(-1)),
        KeyCode::Down => Some(Intent::MoveNav(1)),
        _ => None,
    }
}

/// Apply an intent. Local view changes happen immediately; gateway and
/// poller calls are spawned and report back through `outcomes`.
///
/// Returns `true` if quit is requested, `false` otherwise.
pub fn dispatch_intent(
    intent: Intent,
    app: &mut AppState,
    services: &ClientServices,
    outcomes: &mpsc::UnboundedSender<String>,
) -> bool {
    match intent {
        Intent::Quit => return true,
        Intent::ToggleMenu => app.toggle_menu(),
        Intent::ToggleNotifications => app.toggle_notifications(),
        Intent::MoveNav(delta) => app.move_nav(delta),
        Intent::Login => match app.header().control {
            LoginControl::SetupRequired => app.status_message = SETUP_REQUIRED_MESSAGE.to_string(),
            LoginControl::Account { name } => {
                app.status_message = format!("Already signed in as {name}")
            }
            LoginControl::Loading if app.session.auth_ready() => {
                app.status_message = RewardsError::LoginInProgress.user_message()
            }
            LoginControl::Loading | LoginControl::Initializing => {
                app.status_message = RewardsError::NotReady.user_message()
            }
            LoginControl::InitFailed => {
                app.status_message = "Initialization failed. Press i to retry.".to_string()
            }
            LoginControl::Login => {
                app.status_message = "Opening login...".to_string();
                let gateway = services.gateway.clone();
                let outcomes = outcomes.clone();
                tokio::spawn(async move {
                    let message = match gateway.connect().await {
                        Ok(identity) => format!("Signed in as {}", identity.display_name()),
                        Err(err) => {
                            warn!(error = %err, "login failed");
                            err.user_message()
                        }
                    };
                    let _ = outcomes.send(message);
                });
            }
        },
        Intent::Logout => {
            if !app.session.signed_in() {
                app.status_message = "Not signed in".to_string();
                return false;
            }
            let gateway = services.gateway.clone();
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let message = match gateway.disconnect().await {
                    Ok(()) => "Signed out".to_string(),
                    Err(err) => {
                        warn!(error = %err, "sign out failed");
                        err.user_message()
                    }
                };
                let _ = outcomes.send(message);
            });
        }
        Intent::RefreshIdentity => {
            let gateway = services.gateway.clone();
            let poller = services.poller.clone();
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let message = match gateway.refresh_identity().await {
                    Ok(Some(identity)) => {
                        poller.refresh().await;
                        format!("Refreshed {}", identity.display_name())
                    }
                    Ok(None) => "No active session".to_string(),
                    Err(err) => {
                        warn!(error = %err, "identity refresh failed");
                        err.user_message()
                    }
                };
                let _ = outcomes.send(message);
            });
        }
        Intent::RetryInit => {
            if app.session.setup_required {
                app.status_message = SETUP_REQUIRED_MESSAGE.to_string();
                return false;
            }
            app.status_message = "Retrying initialization...".to_string();
            let gateway = services.gateway.clone();
            let cancel = services.shutdown_token();
            let outcomes = outcomes.clone();
            tokio::spawn(async move {
                let message = match gateway.retry_initialize(&cancel).await {
                    Ok(()) => {
                        info!("identity provider ready after retry");
                        "Authentication service ready".to_string()
                    }
                    Err(RewardsError::Cancelled) => return,
                    Err(err) => err.user_message(),
                };
                let _ = outcomes.send(message);
            });
        }
        Intent::Dismiss(index) => {
            let Some(id) = app.notification_id_at(index) else {
                return false;
            };
            let poller = services.poller.clone();
            tokio::spawn(async move {
                poller.dismiss_notification(id).await;
            });
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zero2hero_rewards::{Notification, SessionState};

    use crate::tui::runtime::new_log_buffer;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with_notifications(count: usize) -> AppState {
        let notifications = (0..count)
            .map(|i| Notification {
                id: i as i64 + 1,
                user_id: 1,
                kind: "reward".to_string(),
                message: format!("message {i}"),
                is_read: false,
                created_at: Utc::now(),
            })
            .collect();
        let session = SessionState {
            notifications,
            ..SessionState::default()
        };
        AppState::new(session, new_log_buffer())
    }

    #[test]
    fn test_letter_bindings() {
        let app = app_with_notifications(0);
        assert_eq!(map_key(&app, key(KeyCode::Char('l'))), Some(Intent::Login));
        assert_eq!(map_key(&app, key(KeyCode::Char('o'))), Some(Intent::Logout));
        assert_eq!(map_key(&app, key(KeyCode::Char('u'))), Some(Intent::RefreshIdentity));
        assert_eq!(map_key(&app, key(KeyCode::Char('i'))), Some(Intent::RetryInit));
        assert_eq!(map_key(&app, key(KeyCode::Char('m'))), Some(Intent::ToggleMenu));
        assert_eq!(map_key(&app, key(KeyCode::Char('n'))), Some(Intent::ToggleNotifications));
        assert_eq!(map_key(&app, key(KeyCode::Char('q'))), Some(Intent::Quit));
        assert_eq!(map_key(&app, key(KeyCode::Char('z'))), None);
        assert_eq!(
            map_key(&app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Intent::Quit)
        );
    }

    #[test]
    fn test_digits_address_existing_notifications_only() {
        let app = app_with_notifications(2);
        assert_eq!(map_key(&app, key(KeyCode::Char('1'))), Some(Intent::Dismiss(0)));
        assert_eq!(map_key(&app, key(KeyCode::Char('2'))), Some(Intent::Dismiss(1)));
        assert_eq!(map_key(&app, key(KeyCode::Char('3'))), None);
        assert_eq!(map_key(&app, key(KeyCode::Char('0'))), None);
    }
}
