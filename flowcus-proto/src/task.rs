//! Task model and emoji helpers.
//!
//! A [`Task`] pairs a user-supplied name with a [`Track`]; the task is
//! finished by listening to the track. The JSON field names follow the
//! shape the web client used (`taskName`, `isCompleted`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::track::Track;

/// Maximum allowed task name length in characters.
pub const MAX_TASK_NAME_LENGTH: usize = 256;

/// Emoji shown when the user does not pick one.
pub const DEFAULT_EMOJI: &str = "\u{2705}";

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task that is completed by listening to its track.
///
/// `completed` only ever moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier, fixed at creation.
    pub id: TaskId,
    /// User-supplied label.
    #[serde(rename = "taskName")]
    pub name: String,
    /// Display glyph.
    pub emoji: String,
    /// The song that has to be listened to.
    pub track: Track,
    /// Whether the task has been completed.
    #[serde(rename = "isCompleted")]
    pub completed: bool,
}

impl Task {
    /// Builds a fresh, incomplete task with a new identifier.
    ///
    /// A blank `emoji` falls back to [`DEFAULT_EMOJI`]. Name validation is
    /// the caller's job.
    #[must_use]
    pub fn new(name: impl Into<String>, emoji: Option<&str>, track: Track) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            emoji: resolve_emoji(emoji),
            track,
            completed: false,
        }
    }
}

/// Converts a unified emoji code such as `1F600` or `1F469-200D-1F4BB` to
/// the glyph it names.
///
/// Returns `None` if any segment is not a hex code point.
#[must_use]
pub fn emoji_from_unified(unified: &str) -> Option<String> {
    let unified = unified.trim();
    if unified.is_empty() {
        return None;
    }
    unified
        .split('-')
        .map(|part| u32::from_str_radix(part, 16).ok().and_then(char::from_u32))
        .collect()
}

/// Picks the emoji to store for user input.
///
/// Accepts a literal glyph, a `U+`-prefixed code, or a bare unified code
/// that names at least one emoji code point. Any other text is kept as
/// typed, so words like `face` are not read as hex. Blank input and
/// invalid `U+` codes yield [`DEFAULT_EMOJI`].
#[must_use]
pub fn resolve_emoji(input: Option<&str>) -> String {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_EMOJI.to_string();
    };
    if let Some(code) = raw.strip_prefix("U+").or_else(|| raw.strip_prefix("u+")) {
        return emoji_from_unified(code).unwrap_or_else(|| DEFAULT_EMOJI.to_string());
    }
    if looks_unified(raw)
        && let Some(glyph) = emoji_from_unified(raw)
    {
        return glyph;
    }
    raw.to_string()
}

/// Whether `raw` is dash-separated 4 to 6 digit hex code points with at
/// least one of them in an emoji range.
fn looks_unified(raw: &str) -> bool {
    let mut has_emoji = false;
    for part in raw.split('-') {
        if !(4..=6).contains(&part.len()) || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        has_emoji |= u32::from_str_radix(part, 16).is_ok_and(is_emoji_code_point);
    }
    has_emoji
}

const fn is_emoji_code_point(cp: u32) -> bool {
    matches!(
        cp,
        0x00A9
            | 0x00AE
            | 0x200D
            | 0x203C
            | 0x2049
            | 0x20E3
            | 0x2122
            | 0x2139
            | 0x2194..=0x21AA
            | 0x231A..=0x23FF
            | 0x24C2
            | 0x25AA..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B55
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0xFE0F
            | 0x1F000..=0x1FAFF
            | 0xE0020..=0xE007F
    )
}
