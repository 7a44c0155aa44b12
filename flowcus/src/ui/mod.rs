//! Terminal UI rendering.

pub mod header;
pub mod new_task;
pub mod status_bar;
pub mod task_list;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    text::Span,
    widgets::Paragraph,
};

use crate::app::{App, Mode};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Quote
            Constraint::Min(3),    // Tasks or form
            Constraint::Length(1), // Notification
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    header::render(frame, chunks[0], app);
    if app.mode == Mode::Browse {
        task_list::render(frame, chunks[1], app);
    } else {
        new_task::render(frame, chunks[1], app);
    }

    if let Some(message) = &app.snapshot.notification {
        let line = Paragraph::new(Span::styled(format!(" {message} "), theme::notification()));
        frame.render_widget(line, chunks[2]);
    }

    status_bar::render(frame, chunks[3], app);
}
