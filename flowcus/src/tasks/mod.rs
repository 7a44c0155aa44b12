//! Task collection for the dashboard.
//!
//! Tasks are appended by the user and never removed; the only mutation is
//! marking a task completed. The display order is derived on demand from
//! the active task and completion order.

pub mod store;

pub use store::TaskStore;

use thiserror::Error;

/// Errors that can occur when creating tasks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Task name cannot be empty.
    #[error("task name cannot be empty")]
    NameEmpty,
    /// Task name exceeds the maximum length.
    #[error("task name too long (max 256 characters)")]
    NameTooLong,
}
