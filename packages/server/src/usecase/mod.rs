//! UseCase 層
//!
//! リレーの操作を 1 ユースケース 1 ファイルで実装するレイヤー。
//! UI 層（WebSocket / HTTP ハンドラ）から呼び出され、Domain 層の trait を操作します。

pub mod connect_client;
pub mod disconnect_client;
pub mod error;
pub mod join_conversation;
pub mod leave_conversation;
pub mod metrics;
pub mod publish_message;

pub use connect_client::ConnectClientUseCase;
pub use disconnect_client::DisconnectClientUseCase;
pub use error::{ConnectError, MembershipError, PublishError};
pub use join_conversation::JoinConversationUseCase;
pub use leave_conversation::LeaveConversationUseCase;
pub use publish_message::{FrameEncoder, PublishCommand, PublishMessageUseCase, PublishReceipt};
