//! CLI companion for the Parley relay.
//!
//! `listen` opens a WebSocket session and prints room traffic; `publish`
//! hands a message to the ingestion endpoint the way the persistence service
//! would.

pub mod command;
pub mod error;
pub mod formatter;
pub mod publish;
pub mod session;

pub use error::ClientError;
pub use publish::publish_message;
pub use session::run_listen;
