//! Logger setup shared by all Parley binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Otherwise the filter defaults to
/// `<crate_name>=<level>,tower_http=<level>`, where the crate name is derived
/// from the binary name (`parley-server` -> `parley_server`).
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(bin_name, default_level)));

    // Ignore the error when a subscriber is already installed (e.g. in tests).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(true).with_target(true))
        .try_init();
}

fn default_directives(bin_name: &str, default_level: &str) -> String {
    let crate_name = bin_name.replace('-', "_");
    format!("{crate_name}={default_level},parley_server={default_level},tower_http={default_level}")
}
