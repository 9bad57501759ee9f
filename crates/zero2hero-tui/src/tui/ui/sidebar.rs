/*
[INPUT]:  Selected NavItem, total earnings
[OUTPUT]: Sidebar navigation panel rendered into Ratatui frame
[POS]:    TUI UI sidebar
[UPDATE]: When pages are added or the earnings card changes
*/

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use rust_decimal::Decimal;

use crate::tui::app::NavItem;
use crate::tui::runtime::{border_style, format_decimal, header_style};

pub(in crate::tui) fn draw_sidebar(
    frame: &mut ratatui::Frame,
    area: ratatui::layout::Rect,
    selected: NavItem,
    total_earnings: Decimal,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(3)])
        .split(area);

    let items = NavItem::ALL
        .iter()
        .map(|item| ListItem::new(Line::from(item.label())))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style())
                .title("Menu"),
        )
        .highlight_style(header_style())
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(Some(selected.index()));
    frame.render_stateful_widget(list, sections[0], &mut state);

    let earnings = Paragraph::new(Line::from(vec![
        Span::raw("Total earnings "),
        Span::raw(format_decimal(total_earnings, 2)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style()),
    );
    frame.render_widget(earnings, sections[1]);
}
