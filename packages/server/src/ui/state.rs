//! Shared application state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::{
    config::RelayConfig,
    domain::{ConnectionRegistry, RoomRouter},
    infrastructure::repository::InMemoryRelayRepository,
};

/// Shared application state
///
/// The registry and the router are the same in-memory instance seen through
/// two traits; handlers only reach membership state through them.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn ConnectionRegistry>,
    pub router: Arc<dyn RoomRouter>,
    pub metrics: PrometheusHandle,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Build a fresh relay instance with its own membership state
    pub fn new(config: RelayConfig, metrics: PrometheusHandle) -> Self {
        let repository = Arc::new(InMemoryRelayRepository::new(config.limits));
        Self {
            registry: repository.clone(),
            router: repository,
            metrics,
            config: Arc::new(config),
        }
    }
}
