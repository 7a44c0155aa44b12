//! Flowcus: task reminders that complete when their song finishes.

pub mod api;
pub mod app;
pub mod config;
pub mod dashboard;
pub mod login;
pub mod notify;
pub mod playback;
pub mod session;
pub mod tasks;
pub mod ui;
