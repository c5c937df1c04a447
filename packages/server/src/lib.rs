//! Realtime relay for Parley.
//!
//! Keeps WebSocket clients subscribed to conversation rooms and fans out
//! messages handed off by the persistence service to every member of a room.
//!
//! Layers, from the inside out:
//! - [`domain`]: connection and room model, repository traits
//! - [`infrastructure`]: in-memory membership state, wire DTOs, metrics recorder
//! - [`usecase`]: one operation per file (connect, join, leave, publish, disconnect)
//! - [`ui`]: axum routes, WebSocket and HTTP handlers, server lifecycle

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::{Args, ConfigError, RelayConfig};
pub use ui::{AppState, ServerError, build_router, run, serve};
