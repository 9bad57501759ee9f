/*
[INPUT]:  Unread notifications from the session snapshot
[OUTPUT]: Notification panel rendered into Ratatui frame
[POS]:    TUI UI notifications panel
[UPDATE]: When notification rows change
*/

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use zero2hero_rewards::Notification;

use crate::tui::runtime::{border_style, key_style};

/// Only the first nine rows have a dismiss key
const DISMISSABLE_ROWS: usize = 9;

pub(in crate::tui) fn draw_notifications(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    notifications: &[Notification],
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(format!("Notifications ({})", notifications.len()));

    if notifications.is_empty() {
        let widget = Paragraph::new("No new notifications").block(block);
        frame.render_widget(widget, area);
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let lines = notifications
        .iter()
        .enumerate()
        .map(|(index, notification)| notification_line(index, notification, width))
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn notification_line(index: usize, notification: &Notification, width: usize) -> Line<'static> {
    let key = if index < DISMISSABLE_ROWS {
        format!("[{}]", index + 1)
    } else {
        "   ".to_string()
    };
    let kind = format!(" {} ", notification.kind);
    let used = key.width() + kind.width() + 1;
    let message = truncate_to_width(&notification.message, width.saturating_sub(used));

    Line::from(vec![
        Span::styled(key, key_style()),
        Span::styled(
            kind,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(message),
    ])
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`
fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}
