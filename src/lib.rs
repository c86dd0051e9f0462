pub mod api;
pub mod chain;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod ingestion;
pub mod intelligence;
pub mod market;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::api::ws_types::WsMessage;
use crate::chain::BalanceSource;
use crate::config::AppConfig;
use crate::db::Store;
use crate::models::AiDecision;
use crate::services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: AppConfig,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub notifier: Option<Arc<Notifier>>,
    /// Latest market decision; `None` until the first cycle.
    pub decision_rx: watch::Receiver<Option<AiDecision>>,
    /// Treasury wallet balance lookup, when the treasury is configured.
    pub balances: Option<Arc<dyn BalanceSource>>,
}
