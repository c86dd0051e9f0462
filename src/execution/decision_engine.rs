use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::db::TreasuryRepo;
use crate::market::MarketDataSource;
use crate::models::{ActivityType, AiDecision, MarketData, TreasuryAction};

/// Supplies the action for a treasury cycle.
#[async_trait]
pub trait DecisionSource: Send + Sync {
    async fn next_decision(&self) -> AiDecision;
}

/// Apply the rule ladder. First match wins:
/// no data, dump, pump, heavy volume, then the accumulation default.
pub fn decide<R: Rng>(
    data: Option<&MarketData>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> AiDecision {
    let (action, confidence, reason) = match data {
        None => {
            let action = if rng.gen_bool(0.5) {
                TreasuryAction::BuyBurn
            } else {
                TreasuryAction::AddLp
            };
            (
                action,
                Decimal::new(95, 2),
                format!("Market data unavailable, fallback pick {action}"),
            )
        }
        Some(d) if d.price_change_5m < Decimal::from(-5) => (
            TreasuryAction::AddLp,
            Decimal::new(90, 2),
            format!(
                "Floor defense: price {}% in 5m, adding liquidity",
                d.price_change_5m.round_dp(2)
            ),
        ),
        Some(d) if d.price_change_5m > Decimal::from(5) => (
            TreasuryAction::BuyBurn,
            Decimal::new(98, 2),
            format!(
                "Momentum: price +{}% in 5m, accelerating with burn",
                d.price_change_5m.round_dp(2)
            ),
        ),
        Some(d) if d.volume_24h > Decimal::from(100_000) => (
            TreasuryAction::BuyBurn,
            Decimal::new(85, 2),
            format!(
                "Consolidation on ${} 24h volume, burning for breakout",
                d.volume_24h.round_dp(0)
            ),
        ),
        Some(d) => (
            TreasuryAction::AddLp,
            Decimal::new(80, 2),
            format!(
                "Base building: flat price ({}% 5m), ${} volume, deepening liquidity",
                d.price_change_5m.round_dp(2),
                d.volume_24h.round_dp(0)
            ),
        ),
    };

    AiDecision {
        action,
        reason,
        confidence,
        timestamp: now,
    }
}

/// Samples the managed token's market, applies [`decide`], publishes the
/// result on a watch channel and records it as an ANALYSIS entry.
pub struct MarketDecisionEngine {
    market: Arc<dyn MarketDataSource>,
    treasury: Arc<dyn TreasuryRepo>,
    mint: String,
    rng: Mutex<StdRng>,
    latest: watch::Sender<Option<AiDecision>>,
}

impl MarketDecisionEngine {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        treasury: Arc<dyn TreasuryRepo>,
        mint: impl Into<String>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let (latest, _) = watch::channel(None);
        Self {
            market,
            treasury,
            mint: mint.into(),
            rng: Mutex::new(rng),
            latest,
        }
    }

    /// Reader half of the latest-decision cell.
    pub fn subscribe(&self) -> watch::Receiver<Option<AiDecision>> {
        self.latest.subscribe()
    }

    pub fn latest(&self) -> Option<AiDecision> {
        self.latest.borrow().clone()
    }

    /// Run one sample-decide-publish cycle.
    pub async fn run_cycle(&self) -> AiDecision {
        let data = self.market.sample(&self.mint).await;

        let decision = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            decide(data.as_ref(), &mut *rng, Utc::now())
        };

        counter!("decision_cycles_total").increment(1);
        tracing::info!(
            action = %decision.action,
            confidence = %decision.confidence,
            reason = %decision.reason,
            has_data = data.is_some(),
            "Market decision"
        );

        self.latest.send_replace(Some(decision.clone()));

        let details = format!("{}: {}", decision.action, decision.reason);
        if let Err(e) = self
            .treasury
            .log_activity(ActivityType::Analysis, Decimal::ZERO, None, Some(&details))
            .await
        {
            tracing::warn!(error = %e, "Failed to log analysis entry");
        }

        decision
    }
}

#[async_trait]
impl DecisionSource for MarketDecisionEngine {
    async fn next_decision(&self) -> AiDecision {
        self.run_cycle().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn market(change: i64, volume: i64) -> MarketData {
        MarketData {
            price: Decimal::new(1, 3),
            volume_24h: Decimal::from(volume),
            price_change_5m: Decimal::from(change),
            sampled_at: Utc::now(),
        }
    }

    fn run(data: Option<MarketData>) -> AiDecision {
        let mut rng = StdRng::seed_from_u64(7);
        decide(data.as_ref(), &mut rng, Utc::now())
    }

    #[test]
    fn test_dump_beats_volume_branch() {
        let d = run(Some(market(-6, 500_000)));
        assert_eq!(d.action, TreasuryAction::AddLp);
        assert_eq!(d.confidence, Decimal::new(90, 2));
    }

    #[test]
    fn test_pump_triggers_burn() {
        let d = run(Some(market(6, 0)));
        assert_eq!(d.action, TreasuryAction::BuyBurn);
        assert_eq!(d.confidence, Decimal::new(98, 2));
    }

    #[test]
    fn test_heavy_volume_flat_price_burns() {
        let d = run(Some(market(0, 100_001)));
        assert_eq!(d.action, TreasuryAction::BuyBurn);
        assert_eq!(d.confidence, Decimal::new(85, 2));
    }

    #[test]
    fn test_default_adds_liquidity() {
        // Boundaries are exclusive: exactly -5, +5 and 100k fall through.
        for data in [market(-5, 0), market(5, 0), market(0, 100_000)] {
            let d = run(Some(data));
            assert_eq!(d.action, TreasuryAction::AddLp);
            assert_eq!(d.confidence, Decimal::new(80, 2));
        }
    }

    #[test]
    fn test_missing_data_fallback_is_seeded() {
        let picks = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| decide(None, &mut rng, Utc::now()).action)
                .collect::<Vec<_>>()
        };

        assert_eq!(picks(42), picks(42));
        let all = picks(42);
        assert!(all
            .iter()
            .all(|a| matches!(a, TreasuryAction::BuyBurn | TreasuryAction::AddLp)));
        assert_eq!(run(None).confidence, Decimal::new(95, 2));
    }

    struct FixedMarket(Option<MarketData>);

    #[async_trait]
    impl MarketDataSource for FixedMarket {
        async fn sample(&self, _mint: &str) -> Option<MarketData> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_cycle_publishes_and_logs_analysis() {
        let store = MemoryStore::new();
        let engine = MarketDecisionEngine::new(
            Arc::new(FixedMarket(Some(market(8, 0)))),
            Arc::new(store.clone()),
            "mint",
            Some(1),
        );
        let rx = engine.subscribe();
        assert!(rx.borrow().is_none());

        let decision = engine.run_cycle().await;

        assert_eq!(decision.action, TreasuryAction::BuyBurn);
        assert_eq!(rx.borrow().as_ref(), Some(&decision));
        let logs = store
            .recent_activity(10, Some(ActivityType::Analysis))
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].details.as_deref().unwrap_or("").starts_with("BUY_BURN"));
    }
}
