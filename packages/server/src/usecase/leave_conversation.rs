//! UseCase: 会話ルームからの離脱処理

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomKey, RoomRouter};

use super::error::MembershipError;

/// 会話ルーム離脱のユースケース
pub struct LeaveConversationUseCase {
    router: Arc<dyn RoomRouter>,
}

impl LeaveConversationUseCase {
    pub fn new(router: Arc<dyn RoomRouter>) -> Self {
        Self { router }
    }

    /// ルーム離脱を実行
    ///
    /// メンバーでないルームからの離脱は `Ok((key, false))` を返す（エラーではない）。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        conversation_id: String,
    ) -> Result<(RoomKey, bool), MembershipError> {
        let key = RoomKey::new(conversation_id)?;
        let left = self.router.leave(connection_id, &key).await?;
        tracing::debug!(%connection_id, room = %key, left, "leave_conversation");
        Ok((key, left))
    }
}
