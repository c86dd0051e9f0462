use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, watch};

use pumpwhale::api::ws_types::WsMessage;
use pumpwhale::chain::{BalanceSource, ChainExecutor, Holder, HolderSource, Transfer};
use pumpwhale::config::AppConfig;
use pumpwhale::db::Store;
use pumpwhale::execution::{
    DecisionSource, RevShareConfig, RevShareDistributor, TreasuryAllocator,
};
use pumpwhale::models::{AiDecision, TreasuryAction};
use pumpwhale::AppState;

pub const MINT: &str = "ManagedMint1111111111111111111111111111111";
pub const OPS_WALLET: &str = "OpsWallet111111111111111111111111111111111";
pub const TREASURY_WALLET: &str = "TreasuryWallet1111111111111111111111111111";

/// Config with the treasury wired up.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::for_database("postgres://unused");
    config.token_mint = Some(MINT.into());
    config.treasury_wallet = Some(TREASURY_WALLET.into());
    config.ops_wallet = Some(OPS_WALLET.into());
    config
}

/// App state over an in-memory store. The returned sender publishes decisions.
#[allow(dead_code)]
pub fn test_state(
    store: Store,
    config: AppConfig,
    balances: Option<Arc<dyn BalanceSource>>,
) -> (AppState, watch::Sender<Option<AiDecision>>) {
    let (ws_tx, _) = broadcast::channel::<WsMessage>(16);
    let (decision_tx, decision_rx) = watch::channel(None);
    let state = AppState {
        store,
        config,
        ws_tx,
        metrics_handle: pumpwhale::metrics::init_metrics(),
        notifier: None,
        decision_rx,
        balances,
    };
    (state, decision_tx)
}

// ---------------------------------------------------------------------------
// Chain fakes
// ---------------------------------------------------------------------------

/// Records every call. Spends fail while `fail_spends` is set; the batch at
/// `fail_batch` (0-based, counted across the executor's lifetime) fails.
#[derive(Default)]
pub struct FakeExecutor {
    pub fail_spends: AtomicBool,
    pub fail_batch: Option<usize>,
    batches_seen: AtomicUsize,
    pub calls: Mutex<Vec<String>>,
    pub batches: Mutex<Vec<Vec<Transfer>>>,
}

#[allow(dead_code)]
impl FakeExecutor {
    pub fn failing_batch(index: usize) -> Self {
        Self {
            fail_batch: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> usize {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

#[async_trait]
impl ChainExecutor for FakeExecutor {
    async fn buy_and_burn(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<String> {
        if self.fail_spends.load(Ordering::SeqCst) {
            anyhow::bail!("swap rejected");
        }
        let n = self.record(format!("burn {mint} {amount_sol}"));
        Ok(format!("tx-{n}"))
    }

    async fn add_liquidity(&self, mint: &str, amount_sol: Decimal) -> anyhow::Result<String> {
        if self.fail_spends.load(Ordering::SeqCst) {
            anyhow::bail!("pool rejected");
        }
        let n = self.record(format!("lp {mint} {amount_sol}"));
        Ok(format!("tx-{n}"))
    }

    async fn transfer(&self, to: &str, amount_sol: Decimal) -> anyhow::Result<String> {
        let n = self.record(format!("transfer {to} {amount_sol}"));
        Ok(format!("tx-{n}"))
    }

    async fn transfer_batch(&self, transfers: &[Transfer]) -> anyhow::Result<String> {
        let index = self.batches_seen.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch == Some(index) {
            anyhow::bail!("batch {index} dropped");
        }
        self.batches.lock().unwrap().push(transfers.to_vec());
        let n = self.record(format!("batch {}", transfers.len()));
        Ok(format!("tx-{n}"))
    }
}

pub struct FakeHolders(pub Vec<Holder>);

#[allow(dead_code)]
impl FakeHolders {
    /// `count` holders with equal balances.
    pub fn equal(count: usize) -> Self {
        Self(
            (0..count)
                .map(|i| Holder {
                    address: format!("holder{i}"),
                    balance: Decimal::from(1_000),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl HolderSource for FakeHolders {
    async fn holders(&self, _mint: &str) -> anyhow::Result<Vec<Holder>> {
        Ok(self.0.clone())
    }
}

pub struct FixedBalance(pub Decimal);

#[async_trait]
impl BalanceSource for FixedBalance {
    async fn sol_balance(&self, _wallet: &str) -> anyhow::Result<Decimal> {
        Ok(self.0)
    }
}

/// Hands out queued actions, then WAIT.
pub struct ScriptedDecisions(Mutex<VecDeque<TreasuryAction>>);

#[allow(dead_code)]
impl ScriptedDecisions {
    pub fn new(actions: impl IntoIterator<Item = TreasuryAction>) -> Self {
        Self(Mutex::new(actions.into_iter().collect()))
    }
}

#[async_trait]
impl DecisionSource for ScriptedDecisions {
    async fn next_decision(&self) -> AiDecision {
        let action = self
            .0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(TreasuryAction::Wait);
        AiDecision {
            action,
            reason: "scripted".into(),
            confidence: Decimal::ONE,
            timestamp: Utc::now(),
        }
    }
}

#[allow(dead_code)]
pub fn allocator(
    store: &Store,
    executor: Arc<FakeExecutor>,
    holders: FakeHolders,
    decisions: ScriptedDecisions,
) -> TreasuryAllocator {
    let revshare = RevShareDistributor::new(
        Arc::new(holders),
        executor.clone(),
        RevShareConfig::default(),
    );
    TreasuryAllocator::new(
        store.treasury.clone(),
        executor,
        revshare,
        Arc::new(decisions),
        MINT,
        OPS_WALLET,
    )
}
