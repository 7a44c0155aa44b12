//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Mode};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.mode {
        Mode::Browse => "↑↓/jk: navigate | Enter: start/complete | n: new task | x: dismiss | q: quit",
        Mode::NewName | Mode::NewEmoji | Mode::Search => "Enter: next | Esc: cancel",
        Mode::PickTrack => "Enter: add task | ←→: page | Backspace: edit search | Esc: back",
    };

    let (dot_color, status_text) = if app.offline {
        (theme::PAUSED, "Offline player")
    } else if app.snapshot.session_expired {
        (theme::PLAYER_OFF, "Session expired, run `flowcus login`")
    } else if app.snapshot.player_ready {
        (theme::PLAYING, "Player ready")
    } else {
        (theme::PLAYER_OFF, "Player not ready")
    };

    let status_line = Line::from(vec![
        Span::styled(concat!("Flowcus v", env!("CARGO_PKG_VERSION")), theme::strong()),
        Span::raw(" | "),
        Span::styled("●", theme::text().fg(dot_color)),
        Span::raw(format!(" {status_text}")),
        Span::raw(" | "),
        Span::styled(help_text, theme::muted()),
    ]);

    let paragraph = Paragraph::new(status_line).style(theme::status_bar());
    frame.render_widget(paragraph, area);
}
