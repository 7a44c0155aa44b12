//! New-task form: name, emoji, then song search.

use flowcus_proto::track::format_duration;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::theme;
use crate::app::{App, Mode};

/// Render the form for the current step.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(Span::styled("New task", theme::title(theme::FORM_TITLE)))
        .borders(Borders::ALL)
        .border_style(theme::focused_border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Summary of earlier steps
            Constraint::Length(2), // Prompt + input
            Constraint::Min(1),    // Results
        ])
        .split(inner);

    let summary = vec![
        Line::from(vec![
            Span::styled("Name:  ", theme::muted()),
            Span::styled(app.draft_name.as_str(), theme::strong()),
        ]),
        Line::from(vec![
            Span::styled("Emoji: ", theme::muted()),
            Span::raw(app.draft_emoji.as_deref().unwrap_or("")),
        ]),
        Line::from(Span::styled(
            app.error.as_deref().unwrap_or(""),
            theme::text().fg(theme::ERROR),
        )),
    ];
    frame.render_widget(Paragraph::new(summary), chunks[0]);

    let prompt = match app.mode {
        Mode::NewName => "Task name:",
        Mode::NewEmoji => "Emoji (glyph or code like 1F600, blank for default):",
        Mode::Search => "Search for a song:",
        Mode::PickTrack | Mode::Browse => "Pick a song (\u{2191}\u{2193}, \u{2190}\u{2192} page, Enter to add):",
    };
    let input = if app.mode == Mode::PickTrack {
        app.search_query.as_str()
    } else {
        app.input.as_str()
    };
    let prompt_lines = vec![
        Line::from(Span::styled(prompt, theme::muted())),
        Line::from(vec![
            Span::styled(input, theme::strong()),
            Span::styled("\u{2588}", theme::text()),
        ]),
    ];
    frame.render_widget(Paragraph::new(prompt_lines), chunks[1]);

    if app.mode == Mode::PickTrack {
        render_results(frame, chunks[2], app);
    }
}

fn render_results(frame: &mut Frame, area: Rect, app: &App) {
    if app.searching {
        frame.render_widget(
            Paragraph::new(Span::styled("Searching...", theme::muted())),
            area,
        );
        return;
    }
    if app.search_results.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No songs found.", theme::muted())),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .search_results
        .iter()
        .map(|track| {
            ListItem::new(Line::from(vec![
                Span::styled(track.name.as_str(), theme::text()),
                Span::styled(
                    format!(
                        "  {}  {}",
                        track.artists_display_name,
                        format_duration(track.duration_ms)
                    ),
                    theme::muted(),
                ),
            ]))
        })
        .collect();
    let list = List::new(items).highlight_style(theme::selected_row());
    let mut state = ListState::default();
    state.select(Some(app.search_selected));
    frame.render_stateful_widget(list, area, &mut state);
}
