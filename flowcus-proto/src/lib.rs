//! Shared definitions for Flowcus: tasks, tracks, player events, and the
//! JSON bodies exchanged between the client and the backend.

pub mod auth;
pub mod player;
pub mod quote;
pub mod task;
pub mod track;
