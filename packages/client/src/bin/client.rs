//! CLI client for the Parley relay.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin parley-client -- listen --conversation conv-42
//! cargo run --bin parley-client -- publish --conversation conv-42 --text "hello"
//! ```

use clap::{Parser, Subcommand};
use parley_client::{publish_message, run_listen};
use parley_shared::logger::setup_logger;
use serde_json::{Value, json};

/// CLI companion for the Parley relay
#[derive(Debug, Parser)]
#[command(name = "parley-client", version, about)]
struct Cli {
    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "PARLEY_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Connect over WebSocket and print messages for the joined conversations
    Listen {
        /// WebSocket endpoint of the relay
        #[arg(long, env = "PARLEY_WS_URL", default_value = "ws://127.0.0.1:8080/ws")]
        url: String,

        /// Conversations to join on connect (repeatable)
        #[arg(short, long = "conversation")]
        conversations: Vec<String>,
    },

    /// Hand a message to the ingestion endpoint
    Publish {
        /// Base HTTP URL of the relay
        #[arg(long, env = "PARLEY_URL", default_value = "http://127.0.0.1:8080")]
        url: String,

        /// Conversation to publish into
        #[arg(short, long)]
        conversation: String,

        /// Plain text body; wrapped as {"senderId", "text"}
        #[arg(short, long, conflicts_with = "json")]
        text: Option<String>,

        /// Raw JSON payload passed through untouched
        #[arg(long)]
        json: Option<String>,

        /// Sender shown with --text
        #[arg(long, default_value = "parley-client")]
        sender: String,

        /// Ingest token sent as a bearer token
        #[arg(long, env = "PARLEY_INGEST_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &cli.log_level);

    let result = match cli.command {
        Commands::Listen { url, conversations } => run_listen(&url, &conversations).await,
        Commands::Publish {
            url,
            conversation,
            text,
            json: raw,
            sender,
            token,
        } => {
            let message = match (text, raw) {
                (_, Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::error!("--json is not valid JSON: {}", e);
                        std::process::exit(2);
                    }
                },
                (Some(text), None) => json!({"senderId": sender, "text": text}),
                (None, None) => {
                    tracing::error!("either --text or --json is required");
                    std::process::exit(2);
                }
            };
            publish_message(&url, &conversation, message, token.as_deref()).await
        }
    };

    if let Err(e) = result {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
