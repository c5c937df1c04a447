//! Realtime relay server.
//!
//! Accepts WebSocket clients on `/ws` and message hand-offs on
//! `POST /api/messages`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-server -- --port 8080
//! ```

use clap::Parser;
use parley_server::{Args, RelayConfig};
use parley_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match RelayConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    if let Err(e) = parley_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
