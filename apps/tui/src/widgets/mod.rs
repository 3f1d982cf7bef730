//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Bottom status bar; highlighted while a run is in progress.
pub(crate) fn status_bar(msg: &str, busy: bool) -> Paragraph<'_> {
    let (bg, prefix) = if busy {
        (Color::Blue, "● ")
    } else {
        (Color::DarkGray, "")
    };
    Paragraph::new(Line::from(vec![Span::raw(" "), Span::raw(prefix), Span::raw(msg)]))
        .style(Style::default().bg(bg).fg(Color::White))
}
