//! Leading-edge collapse window for duplicate player events.
//!
//! Players tend to report the same transition several times in quick
//! succession. The first report acts; repeats with the same key inside the
//! window are discarded.

use std::time::Duration;

use tokio::time::Instant;

/// Default width of the collapse window.
pub const DEFAULT_COLLAPSE_WINDOW: Duration = Duration::from_millis(300);

/// Admits an event unless it repeats the last admitted key within `window`.
#[derive(Debug, Clone)]
pub struct CollapseWindow {
    window: Duration,
    last: Option<(String, Instant)>,
}

impl Default for CollapseWindow {
    fn default() -> Self {
        Self::new(DEFAULT_COLLAPSE_WINDOW)
    }
}

impl CollapseWindow {
    /// Creates a window of the given width.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Returns `true` if the event keyed by `key` at `now` should be handled.
    pub fn admit(&mut self, key: &str, now: Instant) -> bool {
        if let Some((last_key, at)) = &self.last
            && last_key == key
            && now.saturating_duration_since(*at) < self.window
        {
            return false;
        }
        self.last = Some((key.to_string(), now));
        true
    }
}
