//! UseCase: メッセージ配信（Ingestion）処理
//!
//! 永続化サービスが保存済みのメッセージをリレーに渡す唯一の入口。
//! トランスポート非依存で、HTTP ハンドラはこのユースケースを呼ぶだけです。
//! ワイヤ形式へのエンコードは呼び出し元が [`FrameEncoder`] として渡します。
//!
//! 受理（`Ok`）は「ベストエフォート配信として受け付けた」ことを意味し、
//! 全メンバーへの到達は保証しない。受信者ごとの配信結果は呼び出し元に返さない。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PublishMessageUseCase::execute() メソッド
//! - 入力検証（ルームキー・ペイロードの欠落）とエンコード済みフレームの配信
//!
//! ### なぜこのテストが必要か
//! - 不正なリクエストはルーターに到達せずに InvalidRequest になる
//! - ペイロードはクライアントにそのまま届く
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーのいるルーム、メンバーのいないルーム
//! - 異常系：conversationId 欠落・空、message 欠落・null

use std::sync::Arc;

use metrics::{counter, gauge};
use serde_json::Value;

use crate::domain::{RoomKey, RoomRouter};

use super::{
    error::PublishError,
    metrics::{
        CONNECTIONS_ACTIVE, DELIVERY_FAILURES_TOTAL, DISCONNECTIONS_TOTAL,
        MESSAGES_DELIVERED_TOTAL, PUBLISHES_TOTAL,
    },
};

/// ペイロードを 1 回だけ配信フレームにエンコードする関数
pub type FrameEncoder = fn(Value) -> Result<String, serde_json::Error>;

/// 検証前の publish 要求
#[derive(Debug, Clone, Default)]
pub struct PublishCommand {
    pub conversation_id: Option<String>,
    pub message: Option<Value>,
}

/// 受理結果（ログ用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub room: RoomKey,
    pub recipients: usize,
    pub delivered: usize,
    pub evicted: usize,
}

/// メッセージ配信のユースケース
pub struct PublishMessageUseCase {
    router: Arc<dyn RoomRouter>,
    encode: FrameEncoder,
}

impl PublishMessageUseCase {
    /// 新しい PublishMessageUseCase を作成
    pub fn new(router: Arc<dyn RoomRouter>, encode: FrameEncoder) -> Self {
        Self { router, encode }
    }

    /// 配信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(PublishReceipt)` - ベストエフォート配信として受理
    /// * `Err(PublishError::InvalidRequest)` - ルームキーまたはペイロードが不正
    pub async fn execute(&self, command: PublishCommand) -> Result<PublishReceipt, PublishError> {
        let (room, payload) = match validate(command) {
            Ok(valid) => valid,
            Err(e) => {
                counter!(PUBLISHES_TOTAL, "outcome" => "rejected").increment(1);
                tracing::warn!(error = %e, "publish rejected");
                return Err(e);
            }
        };

        let frame = (self.encode)(payload).map_err(|e| PublishError::Encode(e.to_string()))?;

        let report = self.router.broadcast(&room, frame).await;
        let evicted = report.evicted.len();
        counter!(PUBLISHES_TOTAL, "outcome" => "accepted").increment(1);
        counter!(MESSAGES_DELIVERED_TOTAL).increment(report.delivered as u64);
        if evicted > 0 {
            counter!(DELIVERY_FAILURES_TOTAL).increment(evicted as u64);
            counter!(DISCONNECTIONS_TOTAL, "reason" => "evicted").increment(evicted as u64);
            gauge!(CONNECTIONS_ACTIVE).decrement(evicted as f64);
        }

        tracing::info!(
            room = %room,
            recipients = report.recipients,
            delivered = report.delivered,
            evicted,
            "message published"
        );

        Ok(PublishReceipt {
            room,
            recipients: report.recipients,
            delivered: report.delivered,
            evicted,
        })
    }
}

fn validate(command: PublishCommand) -> Result<(RoomKey, Value), PublishError> {
    let conversation_id = command
        .conversation_id
        .ok_or_else(|| PublishError::InvalidRequest("conversationId is required".to_string()))?;
    let room = RoomKey::new(conversation_id)
        .map_err(|e| PublishError::InvalidRequest(format!("conversationId: {e}")))?;
    let payload = match command.message {
        None | Some(Value::Null) => {
            return Err(PublishError::InvalidRequest(
                "message is required".to_string(),
            ));
        }
        Some(payload) => payload,
    };
    Ok((room, payload))
}
