//! UI layer: axum routes, WebSocket and HTTP handlers, and the server runner.

pub mod error;
pub mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{ServerError, build_router, run, serve};
pub use state::AppState;
