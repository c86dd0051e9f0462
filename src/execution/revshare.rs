use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::chain::{ChainExecutor, Holder, HolderSource, Transfer};

/// Below this there is nothing worth distributing.
pub const MIN_DISTRIBUTION_SOL: Decimal = Decimal::from_parts(1, 0, 0, false, 3);
/// Payouts at or below this are not worth the network fee.
pub const DUST_FLOOR_SOL: Decimal = Decimal::from_parts(5, 0, 0, false, 6);

#[derive(Debug, Clone)]
pub struct RevShareConfig {
    /// Minimum fraction of the snapshot supply a holder needs (0.0005 = 0.05%).
    pub min_share: Decimal,
    pub batch_size: usize,
}

impl Default for RevShareConfig {
    fn default() -> Self {
        Self {
            min_share: Decimal::new(5, 4),
            batch_size: 15,
        }
    }
}

/// Why a distribution did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    AmountTooSmall,
    EmptySnapshot,
    NoEligibleHolders,
}

/// Outcome of one distribution. Partial success is normal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RevShareReport {
    pub skipped: Option<SkipReason>,
    pub eligible: usize,
    pub sent_sol: Decimal,
    pub recipients: usize,
    pub batches_ok: usize,
    pub batches_failed: usize,
    pub tx_refs: Vec<String>,
}

impl RevShareReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// Compute payouts for a snapshot.
///
/// Shares are taken against the whole snapshot supply, ineligible holders
/// included, and are not renormalised after the eligibility or dust filters.
pub fn plan_payouts(
    amount_sol: Decimal,
    holders: &[Holder],
    min_share: Decimal,
) -> Result<Vec<Transfer>, SkipReason> {
    if amount_sol < MIN_DISTRIBUTION_SOL {
        return Err(SkipReason::AmountTooSmall);
    }
    if holders.is_empty() {
        return Err(SkipReason::EmptySnapshot);
    }

    let total_supply: Decimal = holders.iter().map(|h| h.balance).sum();
    if total_supply <= Decimal::ZERO {
        return Err(SkipReason::NoEligibleHolders);
    }

    let eligible: Vec<&Holder> = holders
        .iter()
        .filter(|h| h.balance / total_supply >= min_share)
        .collect();
    if eligible.is_empty() {
        return Err(SkipReason::NoEligibleHolders);
    }

    Ok(eligible
        .into_iter()
        .map(|h| Transfer {
            to: h.address.clone(),
            amount_sol: amount_sol * h.balance / total_supply,
        })
        .filter(|t| t.amount_sol > DUST_FLOOR_SOL)
        .collect())
}

/// Snapshots holders and sends batched proportional payouts.
#[derive(Clone)]
pub struct RevShareDistributor {
    holders: Arc<dyn HolderSource>,
    executor: Arc<dyn ChainExecutor>,
    config: RevShareConfig,
}

impl RevShareDistributor {
    pub fn new(
        holders: Arc<dyn HolderSource>,
        executor: Arc<dyn ChainExecutor>,
        config: RevShareConfig,
    ) -> Self {
        Self {
            holders,
            executor,
            config,
        }
    }

    /// Distribute `amount_sol` to holders of `mint`. Batches go out in order;
    /// a failed batch is logged and the rest still run. Nothing is reversed.
    pub async fn distribute(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<RevShareReport> {
        if amount_sol < MIN_DISTRIBUTION_SOL {
            tracing::info!(amount = %amount_sol, "RevShare amount too small, skipping");
            return Ok(RevShareReport::skipped(SkipReason::AmountTooSmall));
        }

        let snapshot = self.holders.holders(mint).await?;
        let payouts = match plan_payouts(amount_sol, &snapshot, self.config.min_share) {
            Ok(p) => p,
            Err(reason) => {
                tracing::info!(?reason, holders = snapshot.len(), "RevShare skipped");
                return Ok(RevShareReport::skipped(reason));
            }
        };

        let mut report = RevShareReport {
            eligible: payouts.len(),
            ..RevShareReport::default()
        };

        for (i, batch) in payouts.chunks(self.config.batch_size.max(1)).enumerate() {
            let batch_total: Decimal = batch.iter().map(|t| t.amount_sol).sum();
            match self.executor.transfer_batch(batch).await {
                Ok(tx) => {
                    report.batches_ok += 1;
                    report.recipients += batch.len();
                    report.sent_sol += batch_total;
                    report.tx_refs.push(tx);
                }
                Err(e) => {
                    report.batches_failed += 1;
                    counter!("revshare_batches_failed_total").increment(1);
                    tracing::error!(
                        batch = i,
                        legs = batch.len(),
                        amount = %batch_total,
                        error = %e,
                        "RevShare batch failed"
                    );
                }
            }
        }

        tracing::info!(
            sent = %report.sent_sol,
            recipients = report.recipients,
            batches_ok = report.batches_ok,
            batches_failed = report.batches_failed,
            "RevShare distribution finished"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
