//! Quote-of-the-day header.

use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::App;

/// Render the daily quote, or a placeholder while it loads.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let line = app.quote.as_ref().map_or_else(
        || Line::from(Span::styled("Loading today's quote...", theme::muted())),
        |quote| {
            Line::from(vec![
                Span::styled(format!("\u{201c}{}\u{201d}", quote.quote), theme::quote()),
                Span::styled(format!("  \u{2014} {}", quote.author), theme::muted()),
            ])
        },
    );

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(theme::muted());
    let paragraph = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}
