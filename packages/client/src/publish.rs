//! Ingestion endpoint client.

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::error::ClientError;

/// Hand `message` to the relay for fan-out into `conversation_id`.
pub async fn publish_message(
    base_url: &str,
    conversation_id: &str,
    message: Value,
    token: Option<&str>,
) -> Result<(), ClientError> {
    let url = format!("{}/api/messages", base_url.trim_end_matches('/'));
    let mut request = reqwest::Client::new().post(&url).json(&json!({
        "conversationId": conversation_id,
        "message": message,
    }));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::ACCEPTED {
        tracing::info!(%conversation_id, "message accepted");
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Rejected {
        status: status.as_u16(),
        body,
    })
}
