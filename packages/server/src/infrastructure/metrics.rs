//! Prometheus recorder for the relay's counters.
//!
//! Metric names live in [`crate::usecase::metrics`]; this module only owns
//! the recorder and its handle, rendered by `GET /metrics`.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder as the global `metrics` recorder.
///
/// Call once at startup, before any metric is recorded.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// A handle whose recorder is not installed globally.
///
/// For embedding the relay where the global recorder is owned elsewhere
/// (tests, several relays in one process). It renders nothing.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorded_counter_is_rendered() {
        // テスト項目: 記録したカウンタが Prometheus 形式で描画される
        // given (前提条件):
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        // when (操作):
        metrics::with_local_recorder(&recorder, || {
            metrics::counter!("relay_joins_total").increment(2);
        });

        // then (期待する結果):
        assert!(handle.render().contains("relay_joins_total 2"));
    }

    #[test]
    fn test_detached_handle_renders_nothing() {
        // テスト項目: 何も記録していないハンドルの描画は空
        assert!(!detached_handle().render().contains("relay_"));
    }
}
