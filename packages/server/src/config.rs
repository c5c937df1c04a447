//! Relay configuration.
//!
//! Command-line flags with environment variable fallbacks, validated into a
//! [`RelayConfig`].

use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use thiserror::Error;

use crate::{
    domain::entity::{DEFAULT_ROOM_CAPACITY, DEFAULT_ROOMS_PER_CONNECTION},
    infrastructure::repository::RelayLimits,
};

/// Default capacity of each connection's outbound queue
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("outbound buffer must be at least 1")]
    ZeroOutboundBuffer,

    #[error("ingest token must not be empty")]
    EmptyIngestToken,
}

/// Realtime relay for Parley
#[derive(Debug, Clone, Parser)]
#[command(name = "parley-server", version, about)]
pub struct Args {
    /// Address to bind
    #[arg(long, env = "PARLEY_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind
    #[arg(short, long, env = "PARLEY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Web origins allowed to open client connections (empty = allow all)
    #[arg(long = "allowed-origin", env = "PARLEY_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Shared secret the persistence service must present as a bearer token
    #[arg(long, env = "PARLEY_INGEST_TOKEN", hide_env_values = true)]
    pub ingest_token: Option<String>,

    /// Capacity of each connection's outbound queue
    #[arg(long, env = "PARLEY_OUTBOUND_BUFFER", default_value_t = DEFAULT_OUTBOUND_BUFFER)]
    pub outbound_buffer: usize,

    /// Maximum rooms a single connection may join (0 = unlimited)
    #[arg(long, env = "PARLEY_MAX_ROOMS_PER_CONNECTION", default_value_t = DEFAULT_ROOMS_PER_CONNECTION)]
    pub max_rooms_per_connection: usize,

    /// Maximum members in a single room (0 = unlimited)
    #[arg(long, env = "PARLEY_MAX_ROOM_SIZE", default_value_t = DEFAULT_ROOM_CAPACITY)]
    pub max_room_size: usize,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "PARLEY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Validated relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub ingest_token: Option<String>,
    pub outbound_buffer: usize,
    pub limits: RelayLimits,
}

impl RelayConfig {
    /// Whether a client connection from `origin` may be accepted.
    ///
    /// Requests without an `Origin` header (non-browser clients) are accepted.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match origin {
            _ if self.allowed_origins.is_empty() => true,
            None => true,
            Some(origin) => self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.trim_end_matches('/') == origin.trim_end_matches('/')),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origins: Vec::new(),
            ingest_token: None,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            limits: RelayLimits::default(),
        }
    }
}

impl TryFrom<Args> for RelayConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.outbound_buffer == 0 {
            return Err(ConfigError::ZeroOutboundBuffer);
        }
        if args.ingest_token.as_deref() == Some("") {
            return Err(ConfigError::EmptyIngestToken);
        }
        Ok(Self {
            addr: SocketAddr::new(args.host, args.port),
            allowed_origins: args
                .allowed_origins
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            ingest_token: args.ingest_token,
            outbound_buffer: args.outbound_buffer,
            limits: RelayLimits {
                max_rooms_per_connection: non_zero(args.max_rooms_per_connection),
                max_room_size: non_zero(args.max_room_size),
            },
        })
    }
}

fn non_zero(value: usize) -> Option<usize> {
    (value > 0).then_some(value)
}
