//! Property tests for the display helpers in `flowcus-proto`.
//!
//! Uses proptest to verify:
//! 1. `format_artists` keeps every name and never panics.
//! 2. `format_duration` always renders two-digit seconds.
//! 3. Any valid emoji glyph survives a unified-code round trip.
//! 4. `resolve_emoji` never yields an empty string.

#![allow(clippy::unwrap_used)]

use std::fmt::Write as _;

use flowcus_proto::task::{DEFAULT_EMOJI, emoji_from_unified, resolve_emoji};
use flowcus_proto::track::{format_artists, format_duration};
use proptest::prelude::*;

/// Strategy for artist names without the separators used by the formatter.
fn arb_artist() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,20}"
}

proptest! {
    #[test]
    fn format_artists_keeps_every_name(artists in prop::collection::vec(arb_artist(), 0..8)) {
        let formatted = format_artists(&artists);
        for artist in &artists {
            prop_assert!(formatted.contains(artist.as_str()));
        }
        if artists.is_empty() {
            prop_assert!(formatted.is_empty());
        }
    }

    #[test]
    fn format_duration_seconds_are_two_digits(ms in 0u64..10_000_000) {
        let formatted = format_duration(ms);
        let (minutes, seconds) = formatted.split_once(':').unwrap();
        prop_assert_eq!(seconds.len(), 2);
        prop_assert_eq!(minutes.parse::<u64>().unwrap(), ms / 60_000);
    }

    #[test]
    fn unified_round_trip(chars in prop::collection::vec(any::<char>(), 1..4)) {
        let mut unified = String::new();
        for (i, c) in chars.iter().enumerate() {
            if i > 0 {
                unified.push('-');
            }
            write!(unified, "{:X}", u32::from(*c)).unwrap();
        }
        let glyph: String = chars.iter().collect();
        prop_assert_eq!(emoji_from_unified(&unified), Some(glyph));
    }

    #[test]
    fn resolve_emoji_is_never_empty(input in proptest::option::of(".{0,12}")) {
        let emoji = resolve_emoji(input.as_deref());
        prop_assert!(!emoji.is_empty());
        if input.as_deref().map_or(true, |s| s.trim().is_empty()) {
            prop_assert_eq!(emoji, DEFAULT_EMOJI);
        }
    }
}
