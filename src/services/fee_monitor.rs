use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration};

use crate::chain::BalanceSource;
use crate::db::TreasuryRepo;
use crate::execution::{CycleReport, TreasuryAllocator};
use crate::models::PotBalances;

use super::dispatcher::Dispatcher;

/// Fees not yet earmarked: wallet balance minus pot savings and the
/// operating reserve, floored at zero.
pub fn unallocated_fees(balance: Decimal, pots: &PotBalances, reserve: Decimal) -> Decimal {
    (balance - pots.total() - reserve).max(Decimal::ZERO)
}

/// Watches the treasury wallet and runs an allocation cycle whenever enough
/// unallocated fees have collected.
pub struct FeeMonitor {
    balances: Arc<dyn BalanceSource>,
    treasury: Arc<dyn TreasuryRepo>,
    allocator: Arc<TreasuryAllocator>,
    treasury_wallet: String,
    threshold: Decimal,
    reserve: Decimal,
    /// Balance a dry-run plan was last produced for.
    planned_balance: Mutex<Option<Decimal>>,
}

impl FeeMonitor {
    pub fn new(
        balances: Arc<dyn BalanceSource>,
        treasury: Arc<dyn TreasuryRepo>,
        allocator: Arc<TreasuryAllocator>,
        treasury_wallet: impl Into<String>,
        threshold: Decimal,
        reserve: Decimal,
    ) -> Self {
        Self {
            balances,
            treasury,
            allocator,
            treasury_wallet: treasury_wallet.into(),
            threshold,
            reserve,
            planned_balance: Mutex::new(None),
        }
    }

    /// One poll. `Ok(None)` when below threshold or a cycle is already running.
    ///
    /// Dry-run cycles move no funds, so the same balance stays above the
    /// threshold. A plan is only produced once per observed balance.
    pub async fn check_once(&self) -> anyhow::Result<Option<CycleReport>> {
        if self.allocator.is_busy() {
            tracing::debug!("Treasury cycle in flight, skipping poll");
            return Ok(None);
        }

        let balance = self.balances.sol_balance(&self.treasury_wallet).await?;
        let pots = self.treasury.pot_balances().await?;
        let unallocated = unallocated_fees(balance, &pots, self.reserve);

        if unallocated < self.threshold {
            tracing::debug!(
                balance = %balance,
                unallocated = %unallocated,
                threshold = %self.threshold,
                "Fees below threshold"
            );
            return Ok(None);
        }

        if self.allocator.is_dry_run() {
            let mut planned = self.planned_balance.lock().await;
            if *planned == Some(balance) {
                tracing::debug!(balance = %balance, "Dry-run plan already produced for this balance");
                return Ok(None);
            }
            *planned = Some(balance);
        }

        tracing::info!(
            balance = %balance,
            unallocated = %unallocated,
            "Fee threshold reached, running treasury cycle"
        );
        self.allocator.run_cycle(unallocated).await.map(Some)
    }
}

/// Poll loop. Errors are logged and retried on the next tick.
pub async fn run_fee_monitor(monitor: FeeMonitor, dispatcher: Dispatcher, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    tracing::info!(
        wallet = %monitor.treasury_wallet,
        threshold = %monitor.threshold,
        interval_secs,
        "Fee monitor started"
    );

    loop {
        ticker.tick().await;

        match monitor.check_once().await {
            Ok(Some(report)) => dispatcher.dispatch_cycle(&report).await,
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Fee monitor poll failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unallocated_excludes_pots_and_reserve() {
        let pots = PotBalances {
            burn_pot: Decimal::new(2, 1),
            lp_pot: Decimal::new(1, 1),
        };
        assert_eq!(
            unallocated_fees(Decimal::ONE, &pots, Decimal::new(1, 2)),
            Decimal::new(69, 2)
        );
        assert_eq!(
            unallocated_fees(Decimal::new(2, 1), &pots, Decimal::new(1, 2)),
            Decimal::ZERO
        );
    }
}
