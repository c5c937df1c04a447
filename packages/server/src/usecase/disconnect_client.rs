//! UseCase: クライアント切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectClientUseCase::execute() / disconnect_all() メソッド
//! - open -> closing -> closed の遷移と全ルームからの削除
//!
//! ### なぜこのテストが必要か
//! - 切断後の配信が届かないことを保証する
//! - 切断イベントの二重発火で失敗しないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルーム参加中の接続の切断
//! - エッジケース：二重切断、シャットダウン時の一括切断

use std::sync::Arc;

use metrics::{counter, gauge};

use crate::domain::{ConnectionId, ConnectionRegistry, RoomKey};

use super::metrics::{CONNECTIONS_ACTIVE, DISCONNECTIONS_TOTAL};

/// クライアント切断のユースケース
pub struct DisconnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectClientUseCase {
    /// 新しい DisconnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// * `Some(Vec<RoomKey>)` - 離脱したルーム
    /// * `None` - 既に登録解除済み（二重発火や配信失敗による切断の後）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Vec<RoomKey>> {
        self.registry.begin_close(connection_id).await;
        let rooms = self.registry.unregister(connection_id).await;
        match &rooms {
            Some(rooms) => {
                counter!(DISCONNECTIONS_TOTAL, "reason" => "client").increment(1);
                gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
                tracing::info!(%connection_id, rooms = rooms.len(), "connection unregistered");
            }
            None => {
                tracing::debug!(%connection_id, "connection already unregistered");
            }
        }
        rooms
    }

    /// 全接続を切断する（シャットダウン時）
    pub async fn disconnect_all(&self) -> usize {
        let count = self.registry.unregister_all().await;
        counter!(DISCONNECTIONS_TOTAL, "reason" => "shutdown").increment(count as u64);
        gauge!(CONNECTIONS_ACTIVE).decrement(count as f64);
        tracing::info!(count, "all connections unregistered");
        count
    }
}
