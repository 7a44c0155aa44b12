//! Task list rendering.

use flowcus_proto::track::format_duration;
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use super::theme;
use crate::app::App;
use crate::dashboard::{RowState, TaskRow};

fn row_line(row: &TaskRow) -> Line<'_> {
    let task = &row.task;
    let (marker, style, detail) = match row.state {
        RowState::Idle => (
            "[ ]",
            theme::text(),
            format_duration(task.track.duration_ms),
        ),
        RowState::Starting => ("[\u{25b8}]", theme::text().fg(theme::PAUSED), "starting...".to_string()),
        RowState::Playing {
            remaining_ms,
            paused,
        } => (
            if paused { "[\u{2016}]" } else { "[\u{266a}]" },
            theme::strong().fg(if paused { theme::PAUSED } else { theme::PLAYING }),
            format!("{} left", format_duration(remaining_ms)),
        ),
        RowState::Completed => ("[\u{2713}]", theme::muted(), "done".to_string()),
    };

    Line::from(vec![
        Span::styled(marker, style),
        Span::raw(format!(" {} ", task.emoji)),
        Span::styled(task.name.as_str(), style),
        Span::styled(
            format!(
                "  {} \u{00b7} {}  ",
                task.track.name, task.track.artists_display_name
            ),
            theme::muted(),
        ),
        Span::styled(detail, style),
    ])
}

/// Render the task list with the current selection.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = if app.snapshot.rows.is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "No tasks yet. Press n to add one.",
            theme::muted(),
        )))]
    } else {
        app.snapshot.rows.iter().map(|r| ListItem::new(row_line(r))).collect()
    };

    let border = if app.fade_frames > 0 {
        theme::focused_border().fg(theme::PLAYING)
    } else {
        theme::text()
    };
    let block = Block::default()
        .title(Span::styled("Tasks", theme::title(theme::TASKS_TITLE)))
        .borders(Borders::ALL)
        .border_style(border);

    let list = List::new(items)
        .block(block)
        .highlight_style(theme::selected_row());
    let mut state = ListState::default();
    if !app.snapshot.rows.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
