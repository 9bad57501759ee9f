/*
[INPUT]:  Session store snapshots, crossterm input, intent outcomes, log buffer
[OUTPUT]: Ratatui-based TUI run loop, rendering, and log buffer utilities
[POS]:    TUI runtime loop and shared helpers
[UPDATE]: When changing TUI layout, keybindings, or runtime controls
*/

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event as CrosstermEvent, KeyEventKind};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::fmt::MakeWriter;

use super::app::AppState;
use super::events::{dispatch_intent, map_key};
use super::terminal::TerminalGuard;
use super::ui::*;
use crate::services::ClientServices;

const UI_TICK_INTERVAL: Duration = Duration::from_millis(250);
const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const LOG_BUFFER_CAPACITY: usize = 2000;
/// Smoke-test hook: quit after this many UI ticks
const EXIT_AFTER_TICKS_ENV: &str = "ZERO2HERO_TUI_EXIT_AFTER_TICKS";

pub type LogBufferHandle = Arc<StdMutex<LogBuffer>>;

#[derive(Debug, Default)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity,
        }
    }

    pub fn push_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    /// Last `count` lines, oldest first
    pub fn tail(&self, count: usize) -> Vec<String> {
        let start = self.lines.len().saturating_sub(count);
        self.lines.iter().skip(start).cloned().collect()
    }
}

pub fn new_log_buffer() -> LogBufferHandle {
    Arc::new(StdMutex::new(LogBuffer::new(LOG_BUFFER_CAPACITY)))
}

#[derive(Clone)]
pub struct LogWriterFactory {
    buffer: LogBufferHandle,
}

impl LogWriterFactory {
    pub fn new(buffer: LogBufferHandle) -> Self {
        Self { buffer }
    }
}

pub struct LogWriter {
    buffer: LogBufferHandle,
    partial: String,
}

impl LogWriter {
    fn push(&self, line: String) {
        // A panic while holding the lock must not silence logging
        let mut guard = match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push_line(line);
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let chunk = String::from_utf8_lossy(buf);
        self.partial.push_str(&chunk);
        while let Some(pos) = self.partial.find('\n') {
            let line = self.partial[..pos].trim_end_matches('\r').to_string();
            self.partial = self.partial[pos + 1..].to_string();
            self.push(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.push(line);
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: self.buffer.clone(),
            partial: String::new(),
        }
    }
}

enum UiEvent {
    Input(CrosstermEvent),
}

pub(crate) fn border_style() -> Style {
    Style::default().fg(Color::Magenta)
}

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn key_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn disabled_style() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC)
}

pub fn format_decimal(value: Decimal, scale: u32) -> String {
    let mut rounded = value.round_dp(scale);
    rounded.rescale(scale);
    rounded.to_string()
}

pub async fn run_tui(
    services: ClientServices,
    log_buffer: LogBufferHandle,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut terminal = TerminalGuard::new()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let input_shutdown = CancellationToken::new();
    let input_shutdown_clone = input_shutdown.clone();

    tokio::task::spawn_blocking(move || {
        while !input_shutdown_clone.is_cancelled() {
            if crossterm::event::poll(INPUT_POLL_INTERVAL).unwrap_or(false) {
                if let Ok(event) = crossterm::event::read() {
                    let _ = event_tx.send(UiEvent::Input(event));
                }
            }
        }
    });

    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<String>();
    let mut session_rx = services.store.subscribe();
    let initial = session_rx.borrow_and_update().clone();
    let mut app = AppState::new(initial, log_buffer);

    let exit_after_ticks = std::env::var(EXIT_AFTER_TICKS_ENV)
        .ok()
        .and_then(|value| value.parse::<u64>().ok());
    let mut ticks: u64 = 0;

    let mut tick = tokio::time::interval(UI_TICK_INTERVAL);
    let mut should_quit = false;

    while !should_quit {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("shutdown requested; leaving TUI");
                should_quit = true;
            }
            _ = tick.tick() => {
                ticks += 1;
                if exit_after_ticks.is_some_and(|limit| ticks >= limit) {
                    should_quit = true;
                }
            }
            changed = session_rx.changed() => {
                if changed.is_err() {
                    should_quit = true;
                }
            }
            Some(message) = outcome_rx.recv() => {
                app.status_message = message;
            }
            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(UiEvent::Input(CrosstermEvent::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(intent) = map_key(&app, key) {
                            debug!(?intent, "key mapped to intent");
                            if dispatch_intent(intent, &mut app, &services, &outcome_tx) {
                                should_quit = true;
                            }
                        }
                    }
                    Some(_) => {}
                    None => should_quit = true,
                }
            }
        }

        app.session = session_rx.borrow_and_update().clone();
        app.sync_panels();
        terminal.draw(|frame| draw_ui(frame, &app))?;
    }

    input_shutdown.cancel();
    Ok(())
}

pub fn draw_ui(frame: &mut ratatui::Frame, app: &AppState) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(area);

    draw_header(frame, layout[0], &app.header());

    let body = if app.menu_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(28), Constraint::Min(20)])
            .split(layout[1]);
        draw_sidebar(frame, columns[0], app.nav, app.session.total_earnings);
        columns[1]
    } else {
        layout[1]
    };

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(body);

    if app.notifications_open {
        draw_notifications(frame, main[0], &app.session.notifications);
    } else {
        draw_page(frame, main[0], app.nav);
    }
    draw_logs(frame, main[1], &app.log_buffer);

    draw_footer(frame, layout[2], app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_log_buffer_drops_oldest_line() {
        let mut buffer = LogBuffer::new(2);
        buffer.push_line("one".to_string());
        buffer.push_line("two".to_string());
        buffer.push_line("three".to_string());
        assert_eq!(buffer.snapshot(), vec!["two", "three"]);
        assert_eq!(buffer.tail(1), vec!["three"]);
    }

    #[test]
    fn test_log_writer_splits_lines_and_flushes_partial() {
        let handle = new_log_buffer();
        let factory = LogWriterFactory::new(handle.clone());
        {
            let mut writer = factory.make_writer();
            writer.write_all(b"first\r\nsec").unwrap();
            writer.write_all(b"ond\nthird").unwrap();
        }
        let lines = handle.lock().unwrap().snapshot();
        assert_eq!(lines, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_format_decimal_pads_to_scale() {
        assert_eq!(format_decimal(Decimal::ZERO, 2), "0.00");
        assert_eq!(format_decimal(Decimal::from_str("42.5").unwrap(), 2), "42.50");
        assert_eq!(format_decimal(Decimal::from_str("1.005").unwrap(), 2), "1.00");
    }
}
