//! Colors and text styles shared by the dashboard widgets.

use ratatui::style::{Color, Modifier, Style};

/// Countdown color while the song plays; also the completion flash.
pub const PLAYING: Color = Color::Green;

/// Countdown color while paused or waiting for the player.
pub const PAUSED: Color = Color::Yellow;

/// Form validation errors.
pub const ERROR: Color = Color::Red;

/// Player indicator when no device is available.
pub const PLAYER_OFF: Color = Color::DarkGray;

/// Task list title.
pub const TASKS_TITLE: Color = Color::Green;

/// New-task form title.
pub const FORM_TITLE: Color = Color::Magenta;

const ACCENT: Color = Color::Cyan;

/// Default text.
#[must_use]
pub fn text() -> Style {
    Style::default().fg(Color::White)
}

/// Secondary text: completed tasks, artists, hints.
#[must_use]
pub fn muted() -> Style {
    Style::default().fg(Color::Gray)
}

/// Emphasized text.
#[must_use]
pub fn strong() -> Style {
    text().add_modifier(Modifier::BOLD)
}

/// Border of the panel that has focus.
#[must_use]
pub fn focused_border() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// The selected row of a list.
#[must_use]
pub fn selected_row() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Quote of the day.
#[must_use]
pub fn quote() -> Style {
    Style::default()
        .fg(Color::Rgb(100, 140, 180))
        .add_modifier(Modifier::ITALIC)
}

/// The snackbar line.
#[must_use]
pub fn notification() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Rgb(220, 220, 160))
        .add_modifier(Modifier::BOLD)
}

/// Status bar background.
#[must_use]
pub fn status_bar() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Bold panel title in `color`.
#[must_use]
pub fn title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
