use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use rust_decimal::Decimal;

use crate::db::{CreatorRepo, PositionRepo};
use crate::models::TrackerEvent;

use super::reputation::ReputationEngine;

/// How long after a whale buy follower trades are attributed to it.
pub const MONITORING_WINDOW_MINUTES: i64 = 10;
/// Round trips shorter than this are churn.
const CHURN_THRESHOLD_MINUTES: i64 = 2;
/// Minimum creator sell size flagged as a dev dump.
const DEV_SELL_MIN_SOL: i64 = 1;

/// Opens, attributes and closes whale positions.
///
/// Events for the same (wallet, mint) must be applied in arrival order; the
/// pipeline guarantees this by consuming the feed sequentially.
#[derive(Clone)]
pub struct PositionTracker {
    positions: Arc<dyn PositionRepo>,
    creators: Arc<dyn CreatorRepo>,
    reputation: ReputationEngine,
}

impl PositionTracker {
    pub fn new(
        positions: Arc<dyn PositionRepo>,
        creators: Arc<dyn CreatorRepo>,
        reputation: ReputationEngine,
    ) -> Self {
        Self {
            positions,
            creators,
            reputation,
        }
    }

    /// Credit impact to other wallets' monitored positions, then open a
    /// position for this wallet if the buy is whale-sized.
    pub async fn on_buy(
        &self,
        mint: &str,
        wallet: &str,
        amount_sol: Decimal,
        timestamp: DateTime<Utc>,
        is_whale: bool,
    ) -> anyhow::Result<Vec<TrackerEvent>> {
        let credited = self
            .positions
            .accrue_impact(mint, wallet, amount_sol, timestamp)
            .await?;

        if credited > 0 {
            tracing::debug!(
                mint = %mint,
                buyer = %wallet,
                amount = %amount_sol,
                positions = credited,
                "Follower buy attributed to monitored positions"
            );
        }

        if !is_whale {
            return Ok(Vec::new());
        }

        let position = self
            .positions
            .open_position(
                wallet,
                mint,
                amount_sol,
                timestamp,
                timestamp + Duration::minutes(MONITORING_WINDOW_MINUTES),
            )
            .await?;

        counter!("positions_opened_total").increment(1);
        gauge!("open_positions").increment(1.0);

        tracing::info!(
            id = position.id,
            wallet = %wallet,
            mint = %mint,
            amount = %amount_sol,
            "Whale position opened"
        );

        Ok(vec![TrackerEvent::PositionOpened(position)])
    }

    /// Close the oldest open position for (wallet, mint) and rescore the
    /// wallet. Sells with nothing open are dropped. Creator sells are flagged
    /// either way.
    pub async fn on_sell(
        &self,
        mint: &str,
        wallet: &str,
        amount_sol: Decimal,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<Vec<TrackerEvent>> {
        let mut events = Vec::new();

        match self
            .positions
            .close_oldest_open(wallet, mint, amount_sol, timestamp)
            .await?
        {
            Some(position) => {
                let pnl = position.pnl_sol.unwrap_or(amount_sol - position.buy_amount_sol);
                let hold_minutes = position.hold_minutes(timestamp);
                let is_churn = hold_minutes < Decimal::from(CHURN_THRESHOLD_MINUTES);

                counter!("positions_closed_total").increment(1);
                gauge!("open_positions").decrement(1.0);

                tracing::info!(
                    id = position.id,
                    wallet = %wallet,
                    mint = %mint,
                    pnl = %pnl,
                    hold_minutes = %hold_minutes.round_dp(2),
                    churn = is_churn,
                    "Whale position closed"
                );

                let tracked = self
                    .reputation
                    .record_close(wallet, pnl, is_churn, timestamp)
                    .await?;

                events.push(TrackerEvent::PositionClosed {
                    position,
                    wallet: tracked,
                    hold_minutes,
                    is_churn,
                });
            }
            None => {
                counter!("orphan_sells_total").increment(1);
                tracing::debug!(
                    wallet = %wallet,
                    mint = %mint,
                    "Sell with no open position, ignoring"
                );
            }
        }

        if amount_sol >= Decimal::from(DEV_SELL_MIN_SOL) {
            if let Some(token) = self.creators.get_token(mint).await? {
                if token.creator_wallet == wallet {
                    counter!("dev_sells_total").increment(1);
                    tracing::warn!(
                        mint = %mint,
                        creator = %wallet,
                        amount = %amount_sol,
                        "Creator sold, flagging token as rugged"
                    );
                    self.creators.mark_rugged(mint).await?;
                    events.push(TrackerEvent::DevSell {
                        mint: mint.to_string(),
                        creator: wallet.to_string(),
                        sol_amount: amount_sol,
                    });
                }
            }
        }

        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
