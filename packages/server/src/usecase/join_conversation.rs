//! UseCase: 会話ルームへの参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinConversationUseCase::execute() メソッド
//! - ルームキーの検証とルーム参加（冪等性、上限）
//!
//! ### なぜこのテストが必要か
//! - 参加した接続だけが配信対象になることを保証する
//! - 不正なルームキーはルームを作らずに拒否する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加、再参加（no-op）
//! - 異常系：空のルームキー、未登録の接続

use std::sync::Arc;

use metrics::counter;

use crate::domain::{ConnectionId, JoinOutcome, RoomKey, RoomRouter};

use super::{
    error::MembershipError,
    metrics::{JOIN_REJECTIONS_TOTAL, JOINS_TOTAL},
};

/// 会話ルーム参加のユースケース
pub struct JoinConversationUseCase {
    router: Arc<dyn RoomRouter>,
}

impl JoinConversationUseCase {
    /// 新しい JoinConversationUseCase を作成
    pub fn new(router: Arc<dyn RoomRouter>) -> Self {
        Self { router }
    }

    /// ルーム参加を実行
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加する接続
    /// * `conversation_id` - クライアントから受け取った会話 ID（未検証の文字列）
    ///
    /// # Returns
    ///
    /// * `Ok((RoomKey, JoinOutcome))` - 参加したルームと結果
    /// * `Err(MembershipError)` - 参加失敗
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        conversation_id: String,
    ) -> Result<(RoomKey, JoinOutcome), MembershipError> {
        let key = RoomKey::new(conversation_id).inspect_err(|_| {
            counter!(JOIN_REJECTIONS_TOTAL).increment(1);
        })?;

        match self.router.join(connection_id, key.clone()).await {
            Ok(outcome) => {
                if outcome == JoinOutcome::Joined {
                    counter!(JOINS_TOTAL).increment(1);
                }
                tracing::debug!(%connection_id, room = %key, ?outcome, "join_conversation");
                Ok((key, outcome))
            }
            Err(e) => {
                counter!(JOIN_REJECTIONS_TOTAL).increment(1);
                tracing::warn!(%connection_id, room = %key, error = %e, "join rejected");
                Err(e.into())
            }
        }
    }
}
