use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{ChainExecutor, Transfer};

/// Logs every treasury action and returns a synthetic reference instead of
/// submitting anything.
#[derive(Debug, Clone, Default)]
pub struct DryRunExecutor;

impl DryRunExecutor {
    pub fn new() -> Self {
        Self
    }

    fn reference(kind: &str) -> String {
        format!("dry-run-{kind}-{}", Uuid::new_v4().simple())
    }
}

#[async_trait]
impl ChainExecutor for DryRunExecutor {
    async fn buy_and_burn(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<String> {
        tracing::info!(mint = %mint, amount = %amount_sol, "[DRY RUN] Would buy and burn");
        Ok(Self::reference("burn"))
    }

    async fn add_liquidity(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<String> {
        tracing::info!(mint = %mint, amount = %amount_sol, "[DRY RUN] Would add liquidity");
        Ok(Self::reference("lp"))
    }

    async fn transfer(&self, to: &str, amount_sol: Decimal) -> anyhow::Result<String> {
        tracing::info!(to = %to, amount = %amount_sol, "[DRY RUN] Would transfer");
        Ok(Self::reference("transfer"))
    }

    async fn transfer_batch(&self, transfers: &[Transfer]) -> anyhow::Result<String> {
        let total: Decimal = transfers.iter().map(|t| t.amount_sol).sum();
        tracing::info!(
            legs = transfers.len(),
            total = %total,
            "[DRY RUN] Would send batched transfer"
        );
        Ok(Self::reference("batch"))
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
