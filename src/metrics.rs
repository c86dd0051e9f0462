use std::sync::OnceLock;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::db::PositionRepo;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Safe to call more than once; later calls return the first handle. If a
/// global recorder is already installed elsewhere, a detached recorder is
/// used so rendering still works.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = match builder.install_recorder() {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(error = %e, "Prometheus recorder already installed, using detached handle");
                    PrometheusBuilder::new().build_recorder().handle()
                }
            };
            register_metrics();
            handle
        })
        .clone()
}

/// Set the `open_positions` gauge from the store. Positions survive restarts,
/// so the gauge must start from the persisted count rather than zero.
pub async fn seed_open_positions(positions: &dyn PositionRepo) -> anyhow::Result<i64> {
    let open = positions.count_open_positions().await?;
    gauge!("open_positions").set(open as f64);
    Ok(open)
}

fn register_metrics() {
    // Pre-register counters so they appear even before the first increment.
    for name in [
        "trade_events_total",
        "whale_sightings_total",
        "positions_opened_total",
        "positions_closed_total",
        "orphan_sells_total",
        "dev_sells_total",
        "treasury_cycles_total",
        "revshare_batches_failed_total",
        "decision_cycles_total",
    ] {
        counter!(name).absolute(0);
    }

    // Pre-register gauges at zero.
    gauge!("open_positions").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("pipeline_latency_seconds").record(0.0);
}
