//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{get_metrics, get_room_detail, get_rooms, get_stats, health_check, publish_message};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
