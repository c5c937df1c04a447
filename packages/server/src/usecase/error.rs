//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// 接続登録のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// 同じ接続 ID が既に登録されている（トランスポート層の不変条件違反）
    #[error("Connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

/// ルーム参加・離脱のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Invalid conversation id: {0}")]
    InvalidRoomKey(#[from] ValueObjectError),

    #[error(transparent)]
    Rejected(#[from] RepositoryError),
}

/// Ingestion（publish）のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// 不正なリクエスト。呼び出し元に同期的に返し、リトライはしない
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to encode event: {0}")]
    Encode(String),
}
