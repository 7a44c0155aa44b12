//! Snackbar-style notification queue.
//!
//! At most one message is visible at a time. Messages are shown in the
//! order they were enqueued and none are dropped: enqueueing while a
//! message is visible closes it early so the backlog keeps moving. The
//! queue is driven by explicit instants so the event loop can sleep on
//! [`NotificationQueue::next_deadline`] and tests can use paused time.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// How long a message stays visible.
pub const DISPLAY_DURATION: Duration = Duration::from_millis(3000);

/// Pause between closing one message and showing the next.
pub const INTER_MESSAGE_GAP: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct Visible {
    message: String,
    shown_at: Instant,
}

/// FIFO of pending messages plus the one currently shown.
#[derive(Debug)]
pub struct NotificationQueue {
    pending: VecDeque<String>,
    visible: Option<Visible>,
    last_closed: Option<Instant>,
    display_for: Duration,
    gap: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    /// Creates an empty queue with the standard timings.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_timings(DISPLAY_DURATION, INTER_MESSAGE_GAP)
    }

    /// Creates an empty queue with custom timings.
    #[must_use]
    pub const fn with_timings(display_for: Duration, gap: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            visible: None,
            last_closed: None,
            display_for,
            gap,
        }
    }

    /// Appends a message. A visible message is dismissed at `now`.
    pub fn enqueue(&mut self, message: impl Into<String>, now: Instant) {
        let message = message.into();
        tracing::debug!(%message, pending = self.pending.len(), "notification queued");
        self.pending.push_back(message);
        if self.visible.is_some() {
            self.dismiss(now);
        }
    }

    /// Closes the visible message, if any.
    pub fn dismiss(&mut self, now: Instant) {
        if self.visible.take().is_some() {
            self.last_closed = Some(now);
        }
    }

    /// Advances the queue to `now` and returns the visible message.
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let expires_at = self.visible.as_ref().map(|v| v.shown_at + self.display_for);
        if let Some(expires_at) = expires_at
            && now >= expires_at
        {
            self.dismiss(expires_at);
        }

        if self.visible.is_none()
            && self.gap_elapsed(now)
            && let Some(message) = self.pending.pop_front()
        {
            self.visible = Some(Visible {
                message,
                shown_at: now,
            });
        }
        self.visible()
    }

    /// The instant at which the next transition is due, if any.
    ///
    /// A pending message that could already be shown reports `now`.
    #[must_use]
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if let Some(visible) = &self.visible {
            return Some(visible.shown_at + self.display_for);
        }
        if self.pending.is_empty() {
            return None;
        }
        Some(
            self.last_closed
                .map_or(now, |closed| (closed + self.gap).max(now)),
        )
    }

    /// The message currently shown.
    #[must_use]
    pub fn visible(&self) -> Option<&str> {
        self.visible.as_ref().map(|v| v.message.as_str())
    }

    /// Messages waiting to be shown, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(String::as_str)
    }

    /// Whether `message` is visible or waiting.
    #[must_use]
    pub fn contains(&self, message: &str) -> bool {
        self.visible() == Some(message) || self.pending().any(|m| m == message)
    }

    fn gap_elapsed(&self, now: Instant) -> bool {
        self.last_closed
            .is_none_or(|closed| now.duration_since(closed) >= self.gap)
    }
}
