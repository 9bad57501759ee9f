/*
[INPUT]:  TUI app state and session snapshots for UI components
[OUTPUT]: UI component render functions and module exports
[POS]:    TUI UI module root
[UPDATE]: When adding a panel
*/

mod header;
mod layout;
mod logs;
mod notifications;
mod sidebar;

pub use header::{HeaderView, LoginControl, SETUP_REQUIRED_MESSAGE};

pub(in crate::tui) use header::draw_header;
pub(in crate::tui) use layout::{draw_footer, draw_page};
pub(in crate::tui) use logs::draw_logs;
pub(in crate::tui) use notifications::draw_notifications;
pub(in crate::tui) use sidebar::draw_sidebar;
