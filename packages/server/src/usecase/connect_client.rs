//! UseCase: クライアント接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectClientUseCase::execute() メソッド
//! - 接続の登録（重複チェック、メトリクス記録）
//!
//! ### なぜこのテストが必要か
//! - 重複した接続 ID はプロセスを落とさずに拒否されなければならない
//! - 新規接続はルームに 1 つも参加していない open 状態で始まる
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規接続の登録
//! - 異常系：重複した connection_id での登録試行

use std::sync::Arc;

use metrics::{counter, gauge};

use crate::domain::{ConnectionId, ConnectionRegistry, OutboundSender, RepositoryError, Timestamp};

use super::{
    error::ConnectError,
    metrics::{CONNECTIONS_ACTIVE, CONNECTIONS_TOTAL, DUPLICATE_CONNECTIONS_TOTAL},
};

/// クライアント接続のユースケース
pub struct ConnectClientUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectClientUseCase {
    /// 新しい ConnectClientUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続登録を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - トランスポート確立時に採番した接続 ID
    /// * `outbox` - この接続の送信キュー
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 登録成功
    /// * `Err(ConnectError)` - 登録失敗
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        outbox: OutboundSender,
    ) -> Result<(), ConnectError> {
        match self
            .registry
            .register(connection_id.clone(), outbox, Timestamp::now())
            .await
        {
            Ok(()) => {
                counter!(CONNECTIONS_TOTAL).increment(1);
                gauge!(CONNECTIONS_ACTIVE).increment(1.0);
                tracing::info!(%connection_id, "connection registered");
                Ok(())
            }
            Err(RepositoryError::DuplicateConnection(id)) => {
                counter!(DUPLICATE_CONNECTIONS_TOTAL).increment(1);
                tracing::error!(connection_id = %id, "duplicate connection id, refusing connection");
                Err(ConnectError::DuplicateConnection(id))
            }
            Err(e) => Err(ConnectError::Repository(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionIdFactory, ConnectionState},
        infrastructure::repository::InMemoryRelayRepository,
    };
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_connect_client_success() {
        // テスト項目: 新規接続が open 状態・ルームなしで登録される
        // given (前提条件):
        let repository = Arc::new(InMemoryRelayRepository::default());
        let usecase = ConnectClientUseCase::new(repository.clone());
        let (tx, _rx) = mpsc::channel(8);
        let id = ConnectionIdFactory::generate();

        // when (操作):
        let result = usecase.execute(id.clone(), tx.into()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        let connection = repository.get_connection(&id).await.unwrap();
        assert_eq!(connection.state, ConnectionState::Open);
        assert!(connection.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_connect_client_duplicate_error() {
        // テスト項目: 重複した connection_id での登録はエラーになり、元の接続は残る
        // given (前提条件):
        let repository = Arc::new(InMemoryRelayRepository::default());
        let usecase = ConnectClientUseCase::new(repository.clone());
        let (tx1, _rx1) = mpsc::channel(8);
        let (tx2, _rx2) = mpsc::channel(8);
        let id = ConnectionIdFactory::generate();
        usecase.execute(id.clone(), tx1.into()).await.unwrap();

        // when (操作):
        let result = usecase.execute(id.clone(), tx2.into()).await;

        // then (期待する結果):
        assert_eq!(result, Err(ConnectError::DuplicateConnection(id.to_string())));
        assert_eq!(repository.count_connections().await, 1);
    }
}
