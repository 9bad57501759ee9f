/*
[INPUT]:  AppState and selected page
[OUTPUT]: Page body and hotkey footer with status line
[POS]:    TUI UI layout pieces shared by every page
[UPDATE]: When key bindings or page copy change
*/

use ratatui::layout::Alignment;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::tui::app::{AppState, NavItem};
use crate::tui::runtime::{border_style, key_style};

pub(in crate::tui) fn draw_page(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    page: NavItem,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title(page.label());
    let widget = Paragraph::new(page.description())
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}

pub(in crate::tui) fn draw_footer(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    app: &AppState,
) {
    let key_style = key_style();
    let line1 = Line::from(vec![
        Span::styled("[l]", key_style),
        Span::raw(" Login  "),
        Span::styled("[o]", key_style),
        Span::raw(" Sign Out  "),
        Span::styled("[u]", key_style),
        Span::raw(" Refresh  "),
        Span::styled("[i]", key_style),
        Span::raw(" Retry Init  "),
        Span::styled("[m]", key_style),
        Span::raw(" Menu  "),
        Span::styled("[n]", key_style),
        Span::raw(" Notifications"),
    ]);
    let line2 = Line::from(vec![
        Span::styled("[1-9]", key_style),
        Span::raw(" Dismiss  "),
        Span::styled("[Up/Down]", key_style),
        Span::raw(" Navigate  "),
        Span::styled("[q]", key_style),
        Span::raw(" Quit  "),
        Span::raw(format!("Status: {}", app.status_message)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style())
        .title("Hotkeys");
    let text = Text::from(vec![line1, line2]);
    let widget = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(widget, area);
}
