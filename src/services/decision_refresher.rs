use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::execution::MarketDecisionEngine;

use super::dispatcher::Dispatcher;

/// Re-run the market decision on a fixed period so the dashboard value stays
/// current between treasury cycles.
pub async fn run_decision_refresher(
    engine: Arc<MarketDecisionEngine>,
    dispatcher: Dispatcher,
    interval_secs: u64,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    tracing::info!(interval_secs, "Decision refresher started");

    loop {
        ticker.tick().await;
        let decision = engine.run_cycle().await;
        dispatcher.dispatch_decision(&decision).await;
    }
}
