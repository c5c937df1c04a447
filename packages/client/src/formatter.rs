//! Human-readable rendering of relay events.

use parley_server::infrastructure::dto::websocket::ServerEvent;
use serde_json::Value;

pub fn format_event(event: &ServerEvent) -> String {
    match event {
        ServerEvent::Connected(payload) => {
            format!("* connected as {}", payload.connection_id)
        }
        ServerEvent::JoinedConversation(id) => format!("* joined {id}"),
        ServerEvent::LeftConversation(id) => format!("* left {id}"),
        ServerEvent::NewMessage(message) => format_message(message),
        ServerEvent::Error(payload) => format!("! {}", payload.message),
    }
}

/// Messages are opaque to the relay; show sender and text when present.
fn format_message(message: &Value) -> String {
    let sender = message.get("senderId").and_then(Value::as_str);
    let text = message.get("text").and_then(Value::as_str);
    match (sender, text) {
        (Some(sender), Some(text)) => format!("{sender}: {text}"),
        (None, Some(text)) => text.to_string(),
        _ => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_server::infrastructure::dto::websocket::ErrorPayload;
    use serde_json::json;

    #[test]
    fn test_format_new_message_with_sender() {
        // テスト項目: senderId と text があれば「送信者: 本文」で表示する
        let event = ServerEvent::NewMessage(json!({"senderId": "alice", "text": "hi"}));
        assert_eq!(format_event(&event), "alice: hi");
    }

    #[test]
    fn test_format_opaque_message() {
        // テスト項目: 形の分からないペイロードは JSON のまま表示する
        let event = ServerEvent::NewMessage(json!([1, 2]));
        assert_eq!(format_event(&event), "[1,2]");
    }

    #[test]
    fn test_format_error() {
        // テスト項目: error イベントは ! 付きで表示する
        let event = ServerEvent::Error(ErrorPayload {
            message: "boom".to_string(),
        });
        assert_eq!(format_event(&event), "! boom");
    }
}
