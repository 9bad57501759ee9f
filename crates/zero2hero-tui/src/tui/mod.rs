/*
[INPUT]:  Client services, session store, log buffer
[OUTPUT]: Ratatui-based TUI for balance, notifications, login and logs
[POS]:    TUI module for the zero2hero binary
[UPDATE]: When changing TUI layout, keybindings, or runtime controls
*/

mod app;
mod events;
mod runtime;
mod terminal;
mod ui;

pub use app::{AppState, Intent, NavItem};
pub use events::{dispatch_intent, map_key};
pub use runtime::{
    LOG_BUFFER_CAPACITY, LogBuffer, LogBufferHandle, LogWriterFactory, draw_ui, format_decimal,
    new_log_buffer, run_tui,
};
pub use ui::{HeaderView, LoginControl, SETUP_REQUIRED_MESSAGE};
