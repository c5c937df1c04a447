//! Client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("publish rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}
