use chrono::Duration;
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::db::{CreatorRepo, SightingRepo, Store};
use crate::intelligence::{PositionTracker, ReputationEngine};
use crate::models::{short, FeedEvent, NewSighting, TokenCreated, TrackerEvent, TradeEvent};
use crate::services::dispatcher::Dispatcher;

use super::token_cache::{TokenCache, TokenMeta};

/// Lookback for the pod reputation stamped on a sighting.
const POD_WINDOW_MINUTES: i64 = 10;

/// Sequential consumer of the trade stream.
///
/// Every event is processed to completion before the next one, which keeps
/// FIFO close matching consistent without per-position locks.
pub struct Pipeline {
    sightings: Arc<dyn SightingRepo>,
    creators: Arc<dyn CreatorRepo>,
    tracker: PositionTracker,
    tokens: Arc<TokenCache>,
    whale_threshold: Decimal,
}

impl Pipeline {
    pub fn new(store: &Store, tokens: Arc<TokenCache>, whale_threshold: Decimal) -> Self {
        let reputation = ReputationEngine::new(store.wallets.clone(), store.positions.clone());
        let tracker = PositionTracker::new(store.positions.clone(), store.creators.clone(), reputation);
        Self {
            sightings: store.sightings.clone(),
            creators: store.creators.clone(),
            tracker,
            tokens,
            whale_threshold,
        }
    }

    pub fn is_whale(&self, sol_amount: Decimal) -> bool {
        sol_amount >= self.whale_threshold
    }

    /// Apply one feed event. Never fails: per-event errors are logged here so
    /// the stream keeps flowing.
    pub async fn process_event(&self, event: &FeedEvent) -> Vec<TrackerEvent> {
        let start = Instant::now();

        let events = match event {
            FeedEvent::Create(created) => {
                self.on_create(created).await;
                Vec::new()
            }
            FeedEvent::Buy(trade) => self.on_trade(trade, true).await,
            FeedEvent::Sell(trade) => self.on_trade(trade, false).await,
        };

        histogram!("pipeline_latency_seconds").record(start.elapsed().as_secs_f64());
        events
    }

    async fn on_create(&self, created: &TokenCreated) {
        self.tokens
            .insert(
                &created.mint,
                TokenMeta {
                    name: created.name.clone(),
                    symbol: created.symbol.clone(),
                    image_uri: created.image_uri.clone(),
                },
            )
            .await;

        if let Err(e) = self
            .creators
            .upsert_token(
                &created.mint,
                &created.creator_wallet,
                &created.name,
                &created.symbol,
                created.image_uri.as_deref(),
            )
            .await
        {
            tracing::warn!(
                mint = %created.mint,
                error = %e,
                "Failed to record token creator, dev-sell detection unavailable for this mint"
            );
        }
    }

    async fn on_trade(&self, trade: &TradeEvent, is_buy: bool) -> Vec<TrackerEvent> {
        counter!("trade_events_total").increment(1);
        let is_whale = self.is_whale(trade.sol_amount);
        let mut events = Vec::new();

        if is_whale {
            let side = if is_buy { "buy" } else { "sell" };
            tracing::info!(
                wallet = %short(&trade.wallet),
                mint = %short(&trade.mint),
                sol = %trade.sol_amount,
                side,
                "Whale trade detected"
            );
            // Awaited inline: the alert carries the stored row. Failures never reach the stream.
            if let Some(sighting) = self.record_sighting(trade, is_buy).await {
                events.push(sighting);
            }
        }

        let tracked = if is_buy {
            self.tracker
                .on_buy(&trade.mint, &trade.wallet, trade.sol_amount, trade.timestamp, is_whale)
                .await
        } else {
            self.tracker
                .on_sell(&trade.mint, &trade.wallet, trade.sol_amount, trade.timestamp)
                .await
        };

        match tracked {
            Ok(mut more) => events.append(&mut more),
            Err(e) => tracing::error!(
                error = %e,
                wallet = %trade.wallet,
                mint = %trade.mint,
                "Position tracking failed"
            ),
        }

        events
    }

    /// Persist a whale sighting. Storage failures are logged and swallowed.
    async fn record_sighting(&self, trade: &TradeEvent, is_buy: bool) -> Option<TrackerEvent> {
        let meta = self.tokens.resolve(&trade.mint).await;

        let pod_reputation = match self
            .sightings
            .pod_reputation(
                &trade.mint,
                trade.timestamp - Duration::minutes(POD_WINDOW_MINUTES),
                trade.timestamp,
            )
            .await
        {
            Ok(pod) => pod,
            Err(e) => {
                tracing::warn!(mint = %trade.mint, error = %e, "Pod reputation lookup failed");
                None
            }
        };

        let new = NewSighting {
            mint: trade.mint.clone(),
            symbol: meta.symbol,
            image_uri: meta.image_uri,
            sol_amount: trade.sol_amount,
            wallet: trade.wallet.clone(),
            is_buy,
            timestamp: trade.timestamp,
            market_cap: trade.market_cap_sol,
            pod_reputation,
        };

        match self.sightings.insert_sighting(&new).await {
            Ok(row) => {
                counter!("whale_sightings_total").increment(1);
                Some(TrackerEvent::WhaleSighted(row))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    wallet = %trade.wallet,
                    mint = %trade.mint,
                    "Failed to persist whale sighting"
                );
                None
            }
        }
    }
}

/// Drain the feed channel through the pipeline and hand results to the
/// dispatcher. Returns when every sender is gone.
pub async fn run_pipeline(
    pipeline: Pipeline,
    mut rx: mpsc::Receiver<FeedEvent>,
    dispatcher: Dispatcher,
) {
    while let Some(event) = rx.recv().await {
        tracing::debug!(event = %event, "Feed event received in pipeline");
        let events = pipeline.process_event(&event).await;
        for e in &events {
            dispatcher.dispatch_tracker_event(e).await;
        }
    }
    tracing::warn!("Feed channel closed");
}
