use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::db::{PositionRepo, WalletRepo};
use crate::models::TrackedWallet;

/// Neutral prior every wallet starts from.
const BASE_SCORE: i64 = 50;
/// Profit contribution saturates at this many SOL / points.
const PROFIT_CAP: i64 = 30;
const CHURN_PENALTY: i64 = 15;

/// Compute a 0-100 reputation from a wallet's running aggregates.
///
/// `win_rate` is a percentage. The result is clamped, then floored.
pub fn compute_reputation(
    total_profit_sol: Decimal,
    win_rate: Decimal,
    is_churn: bool,
    avg_impact_buyers: Decimal,
) -> i32 {
    let mut score = Decimal::from(BASE_SCORE)
        + total_profit_sol.min(Decimal::from(PROFIT_CAP))
        + win_rate * Decimal::new(2, 1);

    if is_churn {
        score -= Decimal::from(CHURN_PENALTY);
    }

    if avg_impact_buyers > Decimal::from(5) {
        score += Decimal::from(5);
    }
    if avg_impact_buyers > Decimal::from(20) {
        score += Decimal::TEN;
    }

    score
        .max(Decimal::ZERO)
        .min(Decimal::ONE_HUNDRED)
        .floor()
        .to_i32()
        .unwrap_or(0)
}

/// Maintains per-wallet reputation from closed positions.
///
/// Running aggregate only: a replayed close would be counted twice.
#[derive(Clone)]
pub struct ReputationEngine {
    wallets: Arc<dyn WalletRepo>,
    positions: Arc<dyn PositionRepo>,
}

impl ReputationEngine {
    pub fn new(wallets: Arc<dyn WalletRepo>, positions: Arc<dyn PositionRepo>) -> Self {
        Self { wallets, positions }
    }

    /// Fold one closed position into the wallet's aggregate and rescore it.
    pub async fn record_close(
        &self,
        wallet: &str,
        pnl: Decimal,
        is_churn: bool,
        closed_at: DateTime<Utc>,
    ) -> anyhow::Result<TrackedWallet> {
        let mut w = match self.wallets.get_wallet(wallet).await? {
            Some(w) => w,
            None => TrackedWallet::new(wallet, closed_at),
        };

        if pnl > Decimal::ZERO {
            w.wins += 1;
        } else {
            w.losses += 1;
        }
        w.total_trades += 1;
        w.total_profit_sol += pnl;
        w.win_rate = Decimal::from(w.wins) / Decimal::from(w.total_trades) * Decimal::ONE_HUNDRED;

        let impact = self.positions.impact_averages(wallet).await?;
        w.avg_impact_volume = impact.avg_volume;
        w.avg_impact_buyers = impact.avg_buyers;

        w.reputation_score = compute_reputation(
            w.total_profit_sol,
            w.win_rate,
            is_churn,
            w.avg_impact_buyers,
        );
        w.max_win_sol = w.max_win_sol.max(pnl);
        w.last_active = closed_at;

        self.wallets.save_wallet(&w).await?;

        tracing::info!(
            wallet = %wallet,
            pnl = %pnl,
            churn = is_churn,
            win_rate = %w.win_rate.round_dp(2),
            reputation = w.reputation_score,
            trades = w.total_trades,
            "Wallet reputation updated"
        );

        Ok(w)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
