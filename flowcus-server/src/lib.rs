//! Flowcus backend library.
//!
//! Exposes the HTTP server for use in tests and embedding. The server
//! performs the Spotify OAuth code exchange, refreshes access tokens, and
//! proxies a daily quote that is fetched upstream at most once per day.

pub mod config;
pub mod oauth;
pub mod quotes;
pub mod server;
pub mod upstream;
