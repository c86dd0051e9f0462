use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::chain::ChainExecutor;
use crate::db::TreasuryRepo;
use crate::models::treasury::pot;
use crate::models::{ActivityType, AiDecision, PotBalances, TreasuryAction};

use super::decision_engine::DecisionSource;
use super::revshare::{RevShareDistributor, RevShareReport};

/// Fixed split of one fee claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeSplit {
    pub revshare: Decimal,
    pub dev: Decimal,
    pub burn: Decimal,
    pub lp: Decimal,
}

/// 30% revshare, 10% dev, 30% burn pot, 30% LP pot.
pub fn split_fees(total_fee: Decimal) -> FeeSplit {
    let thirty = Decimal::new(30, 2);
    FeeSplit {
        revshare: total_fee * thirty,
        dev: total_fee * Decimal::new(10, 2),
        burn: total_fee * thirty,
        lp: total_fee * thirty,
    }
}

/// Outcome of the conditional leg.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpendOutcome {
    /// WAIT, or the selected pot was empty.
    Held,
    Executed { amount: Decimal, tx_ref: String },
    /// Pot left untouched; retried next cycle.
    Failed { amount: Decimal, error: String },
}

/// Everything a treasury cycle did, for logging and broadcast.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Planned only. Pots and the activity ledger were left untouched.
    pub dry_run: bool,
    pub total_fee: Decimal,
    pub split: FeeSplit,
    pub revshare: Option<RevShareReport>,
    pub revshare_error: Option<String>,
    pub dev_tx: Option<String>,
    pub dev_error: Option<String>,
    pub decision: AiDecision,
    pub spend: SpendOutcome,
    pub pots: PotBalances,
}

/// Runs fee cycles: accrue pots, pay fixed obligations, then spend one pot
/// depending on the market decision.
pub struct TreasuryAllocator {
    treasury: Arc<dyn TreasuryRepo>,
    executor: Arc<dyn ChainExecutor>,
    revshare: RevShareDistributor,
    decisions: Arc<dyn DecisionSource>,
    mint: String,
    ops_wallet: String,
    cycle_lock: Mutex<()>,
}

impl TreasuryAllocator {
    pub fn new(
        treasury: Arc<dyn TreasuryRepo>,
        executor: Arc<dyn ChainExecutor>,
        revshare: RevShareDistributor,
        decisions: Arc<dyn DecisionSource>,
        mint: impl Into<String>,
        ops_wallet: impl Into<String>,
    ) -> Self {
        Self {
            treasury,
            executor,
            revshare,
            decisions,
            mint: mint.into(),
            ops_wallet: ops_wallet.into(),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.executor.is_dry_run()
    }

    /// True while a cycle is in flight.
    pub fn is_busy(&self) -> bool {
        self.cycle_lock.try_lock().is_err()
    }

    /// Run one cycle for `total_fee` SOL. Cycles are serialized.
    ///
    /// Only storage failures while accruing abort the cycle; execution
    /// failures are captured in the report. With a dry-run executor the
    /// cycle is planned and logged but nothing is persisted.
    pub async fn run_cycle(&self, total_fee: Decimal) -> anyhow::Result<CycleReport> {
        let _guard = self.cycle_lock.lock().await;
        let dry_run = self.is_dry_run();
        let split = split_fees(total_fee);

        tracing::info!(
            dry_run,
            total = %total_fee,
            revshare = %split.revshare,
            dev = %split.dev,
            burn = %split.burn,
            lp = %split.lp,
            "Treasury cycle started"
        );

        if !dry_run {
            self.treasury
                .log_activity(ActivityType::FeeClaim, total_fee, None, None)
                .await?;
            self.treasury.accrue_pot(pot::BURN, split.burn).await?;
            self.treasury.accrue_pot(pot::LP, split.lp).await?;
        }

        // Fixed obligations first.
        let (revshare, revshare_error) = match self.revshare.distribute(&self.mint, split.revshare).await {
            Ok(report) => {
                if report.sent_sol > Decimal::ZERO && !dry_run {
                    let details = format!(
                        "{} holders, {} batches ok, {} failed",
                        report.recipients, report.batches_ok, report.batches_failed
                    );
                    self.log_best_effort(
                        ActivityType::Revshare,
                        report.sent_sol,
                        report.tx_refs.first().map(String::as_str),
                        &details,
                    )
                    .await;
                }
                (Some(report), None)
            }
            Err(e) => {
                tracing::error!(error = %e, "RevShare distribution failed");
                (None, Some(e.to_string()))
            }
        };

        let (dev_tx, dev_error) = if split.dev > Decimal::ZERO {
            match self.executor.transfer(&self.ops_wallet, split.dev).await {
                Ok(tx) => {
                    tracing::info!(amount = %split.dev, tx = %tx, "Dev share transferred");
                    (Some(tx), None)
                }
                Err(e) => {
                    tracing::error!(amount = %split.dev, error = %e, "Dev transfer failed");
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        let decision = self.decisions.next_decision().await;
        let spend = self.spend(decision.action, &split, dry_run).await?;
        let pots = self.treasury.pot_balances().await?;

        counter!("treasury_cycles_total").increment(1);
        tracing::info!(
            dry_run,
            action = %decision.action,
            burn_pot = %pots.burn_pot,
            lp_pot = %pots.lp_pot,
            "Treasury cycle finished"
        );

        Ok(CycleReport {
            dry_run,
            total_fee,
            split,
            revshare,
            revshare_error,
            dev_tx,
            dev_error,
            decision,
            spend,
            pots,
        })
    }

    /// Spend the whole selected pot. The pot is only drawn down after the
    /// chain call succeeds. A dry run sizes the spend as if this cycle's
    /// share had been accrued and leaves the pot alone.
    async fn spend(
        &self,
        action: TreasuryAction,
        split: &FeeSplit,
        dry_run: bool,
    ) -> anyhow::Result<SpendOutcome> {
        let (pot_name, activity) = match action {
            TreasuryAction::BuyBurn => (pot::BURN, ActivityType::Burn),
            TreasuryAction::AddLp => (pot::LP, ActivityType::LpZap),
            TreasuryAction::Wait => {
                tracing::info!("Decision WAIT, pots carried forward");
                return Ok(SpendOutcome::Held);
            }
        };

        let balances = self.treasury.pot_balances().await?;
        let (saved, share) = if pot_name == pot::BURN {
            (balances.burn_pot, split.burn)
        } else {
            (balances.lp_pot, split.lp)
        };
        let amount = if dry_run { saved + share } else { saved };
        if amount <= Decimal::ZERO {
            tracing::info!(pot = pot_name, "Pot empty, nothing to spend");
            return Ok(SpendOutcome::Held);
        }

        let result = match action {
            TreasuryAction::BuyBurn => self.executor.buy_and_burn(&self.mint, amount).await,
            _ => self.executor.add_liquidity(&self.mint, amount).await,
        };

        match result {
            Ok(tx_ref) if dry_run => {
                tracing::info!(pot = pot_name, amount = %amount, "[DRY RUN] Pot spend planned");
                Ok(SpendOutcome::Executed { amount, tx_ref })
            }
            Ok(tx_ref) => {
                self.treasury.spend_pot(pot_name, amount).await?;
                self.log_best_effort(activity, amount, Some(&tx_ref), action.as_str())
                    .await;
                tracing::info!(pot = pot_name, amount = %amount, tx = %tx_ref, "Pot spent");
                Ok(SpendOutcome::Executed { amount, tx_ref })
            }
            Err(e) => {
                tracing::error!(
                    pot = pot_name,
                    amount = %amount,
                    error = %e,
                    "Pot spend failed, balance carried forward"
                );
                Ok(SpendOutcome::Failed {
                    amount,
                    error: e.to_string(),
                })
            }
        }
    }

    async fn log_best_effort(
        &self,
        activity: ActivityType,
        amount: Decimal,
        tx_ref: Option<&str>,
        details: &str,
    ) {
        if let Err(e) = self
            .treasury
            .log_activity(activity, amount, tx_ref, Some(details))
            .await
        {
            tracing::warn!(activity = %activity, error = %e, "Failed to write activity log");
        }
    }
}
