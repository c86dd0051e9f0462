use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use pumpwhale::api::create_router;
use pumpwhale::api::ws_types::WsMessage;
use pumpwhale::chain::{BalanceSource, ChainExecutor, DryRunExecutor, SolanaRpc};
use pumpwhale::config::AppConfig;
use pumpwhale::db::{self, Store};
use pumpwhale::execution::{
    MarketDecisionEngine, RevShareConfig, RevShareDistributor, TreasuryAllocator,
};
use pumpwhale::ingestion::pipeline::{run_pipeline, Pipeline};
use pumpwhale::ingestion::ws_listener::{run_ws_listener, TradeScope};
use pumpwhale::ingestion::TokenCache;
use pumpwhale::market::DexScreenerFeed;
use pumpwhale::models::{AiDecision, FeedEvent};
use pumpwhale::services::decision_refresher::run_decision_refresher;
use pumpwhale::services::dispatcher::Dispatcher;
use pumpwhale::services::fee_monitor::{run_fee_monitor, FeeMonitor};
use pumpwhale::services::notifier::Notifier;
use pumpwhale::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    tracing::info!("Database connected");
    let store = Store::postgres(pool);

    let metrics_handle = pumpwhale::metrics::init_metrics();
    let open = pumpwhale::metrics::seed_open_positions(store.positions.as_ref()).await?;
    tracing::info!(open, "Open positions gauge seeded");

    // --- Dashboard broadcast + Telegram ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(256);
    let notifier = Notifier::from_config(
        config.telegram_bot_token.as_ref(),
        config.telegram_chat_id.as_ref(),
    )
    .map(Arc::new);
    if notifier.is_none() {
        tracing::info!("Telegram not configured, notifications disabled");
    }
    let dispatcher = Dispatcher::new(ws_tx.clone(), notifier.clone());

    // --- Ingestion: stream → pipeline → dispatcher ---
    let (feed_tx, feed_rx) = mpsc::channel::<FeedEvent>(1000);
    let scope = TradeScope::from_config(&config.tracked_mints, config.token_cache_capacity);
    let ws_url = config.pumpportal_ws_url.clone();
    tokio::spawn(async move {
        run_ws_listener(ws_url, scope, feed_tx).await;
    });

    let tokens = Arc::new(TokenCache::new(
        config.token_cache_capacity,
        store.creators.clone(),
    ));
    let pipeline = Pipeline::new(&store, tokens, config.whale_threshold_sol);
    let pipeline_dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        run_pipeline(pipeline, feed_rx, pipeline_dispatcher).await;
        tracing::warn!("Feed channel closed, pipeline stopped");
    });
    tracing::info!(
        threshold = %config.whale_threshold_sol,
        tracked_mints = config.tracked_mints.len(),
        "Ingestion pipeline spawned"
    );

    // --- Treasury flywheel ---
    let http = reqwest::Client::new();
    let (decision_rx, balances) = match start_treasury(&config, &store, &http, &dispatcher) {
        Some((rx, balances)) => (rx, Some(balances)),
        None => {
            let (_tx, rx) = watch::channel::<Option<AiDecision>>(None);
            (rx, None)
        }
    };

    let state = AppState {
        store,
        config,
        ws_tx,
        metrics_handle,
        notifier,
        decision_rx,
        balances,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

/// Spawn the decision refresher and fee monitor. `None` when the managed
/// token or its wallets are not configured; everything else keeps running.
fn start_treasury(
    config: &AppConfig,
    store: &Store,
    http: &reqwest::Client,
    dispatcher: &Dispatcher,
) -> Option<(watch::Receiver<Option<AiDecision>>, Arc<dyn BalanceSource>)> {
    let (Some(mint), Some(treasury_wallet), Some(ops_wallet)) = (
        config.token_mint.clone(),
        config.treasury_wallet.clone(),
        config.ops_wallet.clone(),
    ) else {
        tracing::warn!("TOKEN_MINT, TREASURY_WALLET or OPS_WALLET missing, treasury disabled");
        return None;
    };

    if !config.dry_run {
        tracing::warn!(
            "No transaction signer available, treasury cycles are planned and logged but not persisted"
        );
    }
    let executor: Arc<dyn ChainExecutor> = Arc::new(DryRunExecutor::new());

    let rpc = Arc::new(SolanaRpc::new(http.clone(), config.solana_rpc_url.clone()));
    let market = Arc::new(DexScreenerFeed::new(
        http.clone(),
        config.dexscreener_url.clone(),
    ));

    let engine = Arc::new(MarketDecisionEngine::new(
        market,
        store.treasury.clone(),
        mint.clone(),
        None,
    ));
    let decision_rx = engine.subscribe();

    tokio::spawn(run_decision_refresher(
        engine.clone(),
        dispatcher.clone(),
        config.decision_interval_secs,
    ));

    let revshare = RevShareDistributor::new(
        rpc.clone(),
        executor.clone(),
        RevShareConfig {
            min_share: config.revshare_min_share,
            batch_size: config.revshare_batch_size,
        },
    );
    let allocator = Arc::new(TreasuryAllocator::new(
        store.treasury.clone(),
        executor,
        revshare,
        engine,
        mint.clone(),
        ops_wallet,
    ));

    let monitor = FeeMonitor::new(
        rpc.clone(),
        store.treasury.clone(),
        allocator,
        treasury_wallet,
        config.fee_threshold_sol,
        config.fee_reserve_sol,
    );
    tokio::spawn(run_fee_monitor(
        monitor,
        dispatcher.clone(),
        config.fee_poll_interval_secs,
    ));

    tracing::info!(mint = %mint, "Treasury flywheel spawned");
    let balances: Arc<dyn BalanceSource> = rpc;
    Some((decision_rx, balances))
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
