pub mod executor;
pub mod rpc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use executor::DryRunExecutor;
pub use rpc::{RpcError, SolanaRpc};

/// One entry of a holder snapshot. `balance` is in raw token units; only
/// ratios between balances matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holder {
    pub address: String,
    pub balance: Decimal,
}

/// A single SOL transfer leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: String,
    pub amount_sol: Decimal,
}

/// SOL balance lookup for the fee wallet.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn sol_balance(&self, wallet: &str) -> anyhow::Result<Decimal>;
}

/// Holder snapshot for a mint.
#[async_trait]
pub trait HolderSource: Send + Sync {
    async fn holders(&self, mint: &str) -> anyhow::Result<Vec<Holder>>;
}

/// Submits treasury transactions. Each call returns a transaction reference.
/// Signing and submission live behind this trait.
#[async_trait]
pub trait ChainExecutor: Send + Sync {
    async fn buy_and_burn(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<String>;
    async fn add_liquidity(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<String>;
    async fn transfer(&self, to: &str, amount_sol: Decimal) -> anyhow::Result<String>;
    /// All legs land in one transaction or none do.
    async fn transfer_batch(&self, transfers: &[Transfer]) -> anyhow::Result<String>;

    /// True when nothing is actually submitted.
    fn is_dry_run(&self) -> bool {
        false
    }
}
