/*
[INPUT]:  Session snapshots from the store, log buffer
[OUTPUT]: AppState, navigation items and user intents for rendering and dispatch
[POS]:    TUI app state
[UPDATE]: When adding pages, panels or intents
*/

use zero2hero_rewards::{NotificationId, SessionState};

use super::runtime::LogBufferHandle;
use super::ui::HeaderView;

/// Sidebar pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavItem {
    #[default]
    Home,
    ReportWaste,
    CollectWaste,
    Rewards,
    Leaderboard,
    Settings,
}

impl NavItem {
    pub const ALL: [NavItem; 6] = [
        NavItem::Home,
        NavItem::ReportWaste,
        NavItem::CollectWaste,
        NavItem::Rewards,
        NavItem::Leaderboard,
        NavItem::Settings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NavItem::Home => "Home",
            NavItem::ReportWaste => "Report Waste",
            NavItem::CollectWaste => "Collect Waste",
            NavItem::Rewards => "Rewards",
            NavItem::Leaderboard => "Leaderboard",
            NavItem::Settings => "Settings",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            NavItem::Home => "Turn waste into rewards. Report litter, collect it, earn tokens.",
            NavItem::ReportWaste => "Report a waste location so a collector can pick it up.",
            NavItem::CollectWaste => "Claim reported waste near you and verify the collection.",
            NavItem::Rewards => "Track earned tokens and redeem available rewards.",
            NavItem::Leaderboard => "See who has collected and reported the most.",
            NavItem::Settings => "Account and notification preferences.",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|item| item == self)
            .unwrap_or_default()
    }

    /// Step through the list, wrapping at both ends
    pub fn step(&self, delta: isize) -> NavItem {
        let len = Self::ALL.len() as isize;
        let next = (self.index() as isize + delta).rem_euclid(len);
        Self::ALL[next as usize]
    }
}

/// What a key press asks the client to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Login,
    Logout,
    RefreshIdentity,
    RetryInit,
    ToggleMenu,
    ToggleNotifications,
    /// Zero-based position in the visible notification list
    Dismiss(usize),
    MoveNav(isize),
    Quit,
}

pub struct AppState {
    pub session: SessionState,
    pub log_buffer: LogBufferHandle,
    pub menu_open: bool,
    pub notifications_open: bool,
    pub nav: NavItem,
    pub status_message: String,
}

impl AppState {
    pub fn new(session: SessionState, log_buffer: LogBufferHandle) -> Self {
        Self {
            session,
            log_buffer,
            menu_open: true,
            notifications_open: false,
            nav: NavItem::default(),
            status_message: String::from("ready"),
        }
    }

    pub fn header(&self) -> HeaderView {
        HeaderView::from_session(&self.session)
    }

    pub fn notification_id_at(&self, index: usize) -> Option<NotificationId> {
        self.session
            .notifications
            .get(index)
            .map(|notification| notification.id)
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn toggle_notifications(&mut self) {
        self.notifications_open = !self.notifications_open;
    }

    pub fn move_nav(&mut self, delta: isize) {
        self.nav = self.nav.step(delta);
    }

    /// Close the notification panel once nothing is left to show
    pub fn sync_panels(&mut self) {
        if self.session.notifications.is_empty() && !self.session.signed_in() {
            self.notifications_open = false;
        }
    }
}
