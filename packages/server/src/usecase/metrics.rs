//! メトリクス名
//!
//! ユースケースと UI 層が `metrics` マクロで記録する。レコーダーは
//! `infrastructure::metrics` がインストールする。

/// 登録された接続数（counter）
pub const CONNECTIONS_TOTAL: &str = "relay_connections_total";
/// 現在登録中の接続数（gauge）
pub const CONNECTIONS_ACTIVE: &str = "relay_connections_active";
/// 登録解除された接続数（counter, labels: reason）
pub const DISCONNECTIONS_TOTAL: &str = "relay_disconnections_total";
/// 重複 ID で拒否された登録（counter）
pub const DUPLICATE_CONNECTIONS_TOTAL: &str = "relay_duplicate_connections_total";
/// ルーム参加（counter）
pub const JOINS_TOTAL: &str = "relay_joins_total";
/// 拒否されたルーム参加（counter）
pub const JOIN_REJECTIONS_TOTAL: &str = "relay_join_rejections_total";
/// publish 要求（counter, labels: outcome）
pub const PUBLISHES_TOTAL: &str = "relay_publishes_total";
/// 送信キューに受理されたフレーム（counter）
pub const MESSAGES_DELIVERED_TOTAL: &str = "relay_messages_delivered_total";
/// 配信失敗で切断された受信者（counter）
pub const DELIVERY_FAILURES_TOTAL: &str = "relay_delivery_failures_total";
