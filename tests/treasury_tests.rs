mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;

use pumpwhale::chain::DryRunExecutor;
use pumpwhale::db::Store;
use pumpwhale::execution::{RevShareConfig, RevShareDistributor, SpendOutcome, TreasuryAllocator};
use pumpwhale::models::{ActivityType, TreasuryAction};
use pumpwhale::services::fee_monitor::FeeMonitor;

use common::{FakeExecutor, FakeHolders, FixedBalance, ScriptedDecisions};

fn sol(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

#[tokio::test]
async fn test_wait_cycles_accumulate_then_burn_spends_whole_pot() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::default());
    let allocator = common::allocator(
        &store,
        executor.clone(),
        FakeHolders::equal(3),
        ScriptedDecisions::new([
            TreasuryAction::Wait,
            TreasuryAction::Wait,
            TreasuryAction::BuyBurn,
        ]),
    );

    let first = allocator.run_cycle(Decimal::ONE).await.unwrap();
    assert!(matches!(first.spend, SpendOutcome::Held));
    assert_eq!(first.pots.burn_pot, sol(3, 1));
    assert_eq!(first.pots.lp_pot, sol(3, 1));

    allocator.run_cycle(Decimal::ONE).await.unwrap();
    let third = allocator.run_cycle(Decimal::ONE).await.unwrap();

    match &third.spend {
        SpendOutcome::Executed { amount, .. } => assert_eq!(*amount, sol(9, 1)),
        other => panic!("expected burn, got {other:?}"),
    }
    assert_eq!(third.pots.burn_pot, Decimal::ZERO);
    assert_eq!(third.pots.lp_pot, sol(9, 1));

    let stats = store.treasury.global_stats().await.unwrap();
    assert_eq!(stats.total_burned, sol(9, 1));
    assert_eq!(stats.total_lp, Decimal::ZERO);
    assert_eq!(stats.distributions, 3);
    assert_eq!(stats.total_revshare, sol(9, 1));

    let claims = store
        .treasury
        .recent_activity(50, Some(ActivityType::FeeClaim))
        .await
        .unwrap();
    assert_eq!(claims.len(), 3);
    let burns = store
        .treasury
        .recent_activity(50, Some(ActivityType::Burn))
        .await
        .unwrap();
    assert_eq!(burns.len(), 1);
    assert!(burns[0].tx_ref.is_some());
}

#[tokio::test]
async fn test_dev_share_goes_to_ops_wallet() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::default());
    let allocator = common::allocator(
        &store,
        executor.clone(),
        FakeHolders::equal(2),
        ScriptedDecisions::new([]),
    );

    let report = allocator.run_cycle(Decimal::TEN).await.unwrap();

    assert!(report.dev_tx.is_some());
    assert_eq!(report.split.dev, Decimal::ONE);
    assert!(executor
        .calls()
        .iter()
        .any(|c| c.starts_with(&format!("transfer {}", common::OPS_WALLET))));
}

#[tokio::test]
async fn test_failed_spend_keeps_pot_for_next_cycle() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::default());
    executor.fail_spends.store(true, Ordering::SeqCst);
    let allocator = common::allocator(
        &store,
        executor.clone(),
        FakeHolders::equal(3),
        ScriptedDecisions::new([TreasuryAction::AddLp, TreasuryAction::AddLp]),
    );

    let failed = allocator.run_cycle(Decimal::ONE).await.unwrap();
    match &failed.spend {
        SpendOutcome::Failed { amount, .. } => assert_eq!(*amount, sol(3, 1)),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(failed.pots.lp_pot, sol(3, 1));
    let lp_logs = store
        .treasury
        .recent_activity(50, Some(ActivityType::LpZap))
        .await
        .unwrap();
    assert!(lp_logs.is_empty());

    executor.fail_spends.store(false, Ordering::SeqCst);
    let retried = allocator.run_cycle(Decimal::ONE).await.unwrap();
    match &retried.spend {
        SpendOutcome::Executed { amount, .. } => assert_eq!(*amount, sol(6, 1)),
        other => panic!("expected spend, got {other:?}"),
    }
    assert_eq!(retried.pots.lp_pot, Decimal::ZERO);
    assert_eq!(retried.pots.burn_pot, sol(6, 1));
}

#[tokio::test]
async fn test_revshare_batch_failure_does_not_stop_cycle() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::failing_batch(1));
    let allocator = common::allocator(
        &store,
        executor.clone(),
        FakeHolders::equal(40),
        ScriptedDecisions::new([TreasuryAction::BuyBurn]),
    );

    let report = allocator.run_cycle(Decimal::ONE).await.unwrap();
    let revshare = report.revshare.expect("revshare report");

    assert_eq!(revshare.eligible, 40);
    assert_eq!(revshare.batches_ok, 2);
    assert_eq!(revshare.batches_failed, 1);
    assert_eq!(revshare.recipients, 25);
    // 0.3 SOL over 40 equal holders, 25 paid
    assert_eq!(revshare.sent_sol, sol(1875, 4));

    let batches = executor.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 15);
    assert_eq!(batches[1].len(), 10);

    assert!(report.dev_tx.is_some());
    assert!(matches!(report.spend, SpendOutcome::Executed { .. }));
}

#[tokio::test]
async fn test_small_fee_skips_revshare_but_still_accrues() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::default());
    let allocator = common::allocator(
        &store,
        executor.clone(),
        FakeHolders::equal(3),
        ScriptedDecisions::new([]),
    );

    // 30% of 0.003 is below the distribution minimum
    let report = allocator.run_cycle(sol(3, 3)).await.unwrap();
    let revshare = report.revshare.expect("revshare report");
    assert!(revshare.skipped.is_some());
    assert!(executor.batches.lock().unwrap().is_empty());
    assert_eq!(report.pots.burn_pot, sol(9, 4));
}

#[tokio::test]
async fn test_fee_monitor_runs_cycle_on_unallocated_fees() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::default());
    let allocator = Arc::new(common::allocator(
        &store,
        executor,
        FakeHolders::equal(3),
        ScriptedDecisions::new([]),
    ));

    let monitor = FeeMonitor::new(
        Arc::new(FixedBalance(sol(131, 2))),
        store.treasury.clone(),
        allocator,
        common::TREASURY_WALLET,
        sol(3, 1),
        sol(1, 2),
    );

    let report = monitor.check_once().await.unwrap().expect("cycle should run");
    assert_eq!(report.total_fee, sol(13, 1));
    assert_eq!(report.pots.burn_pot, sol(39, 2));
}

#[tokio::test]
async fn test_fee_monitor_below_threshold_does_nothing() {
    let store = Store::in_memory();
    let executor = Arc::new(FakeExecutor::default());
    let allocator = Arc::new(common::allocator(
        &store,
        executor.clone(),
        FakeHolders::equal(3),
        ScriptedDecisions::new([]),
    ));

    let monitor = FeeMonitor::new(
        Arc::new(FixedBalance(sol(2, 1))),
        store.treasury.clone(),
        allocator,
        common::TREASURY_WALLET,
        sol(3, 1),
        sol(1, 2),
    );

    assert!(monitor.check_once().await.unwrap().is_none());
    assert!(executor.calls().is_empty());
    let claims = store.treasury.recent_activity(10, None).await.unwrap();
    assert!(claims.is_empty());
}

#[tokio::test]
async fn test_dry_run_plans_once_and_persists_nothing() {
    let store = Store::in_memory();
    let executor = Arc::new(DryRunExecutor::new());
    let revshare = RevShareDistributor::new(
        Arc::new(FakeHolders::equal(3)),
        executor.clone(),
        RevShareConfig::default(),
    );
    let allocator = Arc::new(TreasuryAllocator::new(
        store.treasury.clone(),
        executor,
        revshare,
        Arc::new(ScriptedDecisions::new([
            TreasuryAction::BuyBurn,
            TreasuryAction::BuyBurn,
        ])),
        common::MINT,
        common::OPS_WALLET,
    ));

    let monitor = FeeMonitor::new(
        Arc::new(FixedBalance(Decimal::ONE)),
        store.treasury.clone(),
        allocator,
        common::TREASURY_WALLET,
        sol(3, 1),
        sol(1, 2),
    );

    let plan = monitor.check_once().await.unwrap().expect("plan should be produced");
    assert!(plan.dry_run);
    assert_eq!(plan.total_fee, sol(99, 2));
    match plan.spend {
        SpendOutcome::Executed { amount, .. } => assert_eq!(amount, sol(297, 3)),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(plan.pots.burn_pot, Decimal::ZERO);

    // Same balance on the next poll: no second cycle.
    assert!(monitor.check_once().await.unwrap().is_none());

    let pots = store.treasury.pot_balances().await.unwrap();
    assert_eq!(pots.burn_pot, Decimal::ZERO);
    assert_eq!(pots.lp_pot, Decimal::ZERO);
    assert!(store.treasury.recent_activity(10, None).await.unwrap().is_empty());
    let stats = store.treasury.global_stats().await.unwrap();
    assert_eq!(stats.total_burned, Decimal::ZERO);
    assert_eq!(stats.distributions, 0);
}
