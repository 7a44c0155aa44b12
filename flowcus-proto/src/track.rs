//! Track references attached to tasks.

use serde::{Deserialize, Serialize};

/// A Spotify track as stored on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Spotify URI, e.g. `spotify:track:4uLU6hMCjMI75M1A2tKUQC`.
    pub uri: String,
    /// Track title.
    pub name: String,
    /// Artist names joined for display (see [`format_artists`]).
    #[serde(rename = "artistsDisplayName")]
    pub artists_display_name: String,
    /// Track length in milliseconds.
    pub duration_ms: u64,
    /// Thumbnail image URL.
    pub image: String,
}

/// Joins artist names for display.
///
/// One artist is shown as-is, two are joined with ` & `, and longer lists
/// read `a, b, & c`.
#[must_use]
pub fn format_artists<S: AsRef<str>>(artists: &[S]) -> String {
    match artists {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} & {}", first.as_ref(), second.as_ref()),
        [head @ .., last] => {
            let head: Vec<&str> = head.iter().map(AsRef::as_ref).collect();
            format!("{}, & {}", head.join(", "), last.as_ref())
        }
    }
}

/// Formats milliseconds as `m:ss`.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1000;
    format!("{minutes}:{seconds:02}")
}
