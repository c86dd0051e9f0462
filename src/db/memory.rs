use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::treasury::pot;
use crate::models::{
    ActivityLog, ActivityType, GlobalStats, NewSighting, Position, PositionStatus, PotBalances,
    TokenCreator, TopToken, TrackedWallet, WatchlistEntry, WhaleSighting,
};

use super::creator_repo::CreatorRepo;
use super::position_repo::{ImpactAverages, PositionRepo};
use super::sighting_repo::SightingRepo;
use super::treasury_repo::TreasuryRepo;
use super::wallet_repo::WalletRepo;
use super::watchlist_repo::WatchlistRepo;

/// In-process store implementing every repository trait.
///
/// Used by tests and as a drop-in fake. A single mutex guards all tables, which
/// gives the same per-statement atomicity the Postgres repositories rely on.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    next_position_id: i64,
    positions: BTreeMap<i64, Position>,
    wallets: HashMap<String, TrackedWallet>,
    sightings: Vec<WhaleSighting>,
    tokens: HashMap<String, TokenCreator>,
    pots: HashMap<String, Decimal>,
    activity: Vec<ActivityLog>,
    watchlist: HashMap<String, WatchlistEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn reputation_ok(wallets: &HashMap<String, TrackedWallet>, wallet: &str, min: Option<i32>) -> bool {
    match min {
        None => true,
        Some(min) => wallets
            .get(wallet)
            .map(|w| w.reputation_score >= min)
            .unwrap_or(false),
    }
}

#[async_trait]
impl PositionRepo for MemoryStore {
    async fn open_position(
        &self,
        wallet: &str,
        mint: &str,
        buy_amount_sol: Decimal,
        buy_timestamp: DateTime<Utc>,
        monitoring_expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Position> {
        let mut t = self.inner.lock().await;
        t.next_position_id += 1;
        let pos = Position {
            id: t.next_position_id,
            wallet: wallet.to_string(),
            mint: mint.to_string(),
            buy_amount_sol,
            buy_timestamp,
            status: PositionStatus::Open.as_str().to_string(),
            sell_amount_sol: None,
            sell_timestamp: None,
            pnl_sol: None,
            monitoring_expires_at,
            impact_volume: Decimal::ZERO,
            impact_buyers: 0,
        };
        t.positions.insert(pos.id, pos.clone());
        Ok(pos)
    }

    async fn accrue_impact(
        &self,
        mint: &str,
        buyer: &str,
        amount_sol: Decimal,
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let mut t = self.inner.lock().await;
        let mut credited = 0u64;
        for pos in t.positions.values_mut() {
            if pos.mint == mint && pos.wallet != buyer && pos.is_monitoring(at) {
                pos.impact_volume += amount_sol;
                pos.impact_buyers += 1;
                credited += 1;
            }
        }
        Ok(credited)
    }

    async fn close_oldest_open(
        &self,
        wallet: &str,
        mint: &str,
        sell_amount_sol: Decimal,
        sell_timestamp: DateTime<Utc>,
    ) -> anyhow::Result<Option<Position>> {
        let mut t = self.inner.lock().await;
        let oldest = t
            .positions
            .values_mut()
            .find(|p| p.wallet == wallet && p.mint == mint && p.is_open());

        Ok(oldest.map(|pos| {
            pos.status = PositionStatus::Closed.as_str().to_string();
            pos.sell_amount_sol = Some(sell_amount_sol);
            pos.sell_timestamp = Some(sell_timestamp);
            pos.pnl_sol = Some(sell_amount_sol - pos.buy_amount_sol);
            pos.clone()
        }))
    }

    async fn get_open_positions(&self, limit: i64) -> anyhow::Result<Vec<Position>> {
        let t = self.inner.lock().await;
        let mut open: Vec<Position> = t.positions.values().filter(|p| p.is_open()).cloned().collect();
        open.sort_by(|a, b| b.buy_timestamp.cmp(&a.buy_timestamp).then(b.id.cmp(&a.id)));
        open.truncate(limit.max(0) as usize);
        Ok(open)
    }

    async fn get_positions_by_wallet(&self, wallet: &str, limit: i64) -> anyhow::Result<Vec<Position>> {
        let t = self.inner.lock().await;
        let mut rows: Vec<Position> = t.positions.values().filter(|p| p.wallet == wallet).cloned().collect();
        rows.sort_by(|a, b| b.buy_timestamp.cmp(&a.buy_timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn impact_averages(&self, wallet: &str) -> anyhow::Result<ImpactAverages> {
        let t = self.inner.lock().await;
        let held: Vec<&Position> = t.positions.values().filter(|p| p.wallet == wallet).collect();
        if held.is_empty() {
            return Ok(ImpactAverages::default());
        }
        let n = Decimal::from(held.len() as i64);
        Ok(ImpactAverages {
            avg_volume: held.iter().map(|p| p.impact_volume).sum::<Decimal>() / n,
            avg_buyers: held.iter().map(|p| Decimal::from(p.impact_buyers)).sum::<Decimal>() / n,
        })
    }

    async fn count_open_positions(&self) -> anyhow::Result<i64> {
        let t = self.inner.lock().await;
        Ok(t.positions.values().filter(|p| p.is_open()).count() as i64)
    }
}

#[async_trait]
impl WalletRepo for MemoryStore {
    async fn get_wallet(&self, address: &str) -> anyhow::Result<Option<TrackedWallet>> {
        Ok(self.inner.lock().await.wallets.get(address).cloned())
    }

    async fn save_wallet(&self, wallet: &TrackedWallet) -> anyhow::Result<()> {
        self.inner
            .lock()
            .await
            .wallets
            .insert(wallet.address.clone(), wallet.clone());
        Ok(())
    }

    async fn leaderboard(&self, limit: i64) -> anyhow::Result<Vec<TrackedWallet>> {
        let t = self.inner.lock().await;
        let mut rows: Vec<TrackedWallet> = t.wallets.values().cloned().collect();
        rows.sort_by(|a, b| {
            b.reputation_score
                .cmp(&a.reputation_score)
                .then(b.total_profit_sol.cmp(&a.total_profit_sol))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn reputations(&self, addresses: &[String]) -> anyhow::Result<HashMap<String, i32>> {
        let t = self.inner.lock().await;
        Ok(addresses
            .iter()
            .filter_map(|a| t.wallets.get(a).map(|w| (a.clone(), w.reputation_score)))
            .collect())
    }
}

#[async_trait]
impl SightingRepo for MemoryStore {
    async fn insert_sighting(&self, sighting: &NewSighting) -> anyhow::Result<WhaleSighting> {
        let row = sighting.clone().into_row(Uuid::new_v4());
        self.inner.lock().await.sightings.push(row.clone());
        Ok(row)
    }

    async fn recent_sightings(
        &self,
        limit: i64,
        min_reputation: Option<i32>,
    ) -> anyhow::Result<Vec<WhaleSighting>> {
        let t = self.inner.lock().await;
        let mut rows: Vec<WhaleSighting> = t
            .sightings
            .iter()
            .rev()
            .filter(|s| reputation_ok(&t.wallets, &s.wallet, min_reputation))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn count_whale_buys(
        &self,
        mint: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let t = self.inner.lock().await;
        Ok(t.sightings
            .iter()
            .filter(|s| s.mint == mint && s.is_buy && s.timestamp >= since && s.timestamp <= until)
            .count() as i64)
    }

    async fn pod_reputation(
        &self,
        mint: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<Option<i32>> {
        let t = self.inner.lock().await;
        let wallets: HashSet<&str> = t
            .sightings
            .iter()
            .filter(|s| s.mint == mint && s.is_buy && s.timestamp >= since && s.timestamp <= until)
            .map(|s| s.wallet.as_str())
            .collect();
        let scores: Vec<i32> = wallets
            .into_iter()
            .filter_map(|w| t.wallets.get(w).map(|tw| tw.reputation_score))
            .collect();
        if scores.is_empty() {
            return Ok(None);
        }
        Ok(Some(scores.iter().sum::<i32>().div_euclid(scores.len() as i32)))
    }

    async fn top_tokens(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        min_reputation: Option<i32>,
    ) -> anyhow::Result<Vec<TopToken>> {
        struct Agg<'a> {
            symbol: &'a str,
            wallets: HashSet<&'a str>,
            volume: Decimal,
            last_seen: DateTime<Utc>,
        }

        let t = self.inner.lock().await;
        let mut by_mint: HashMap<&str, Agg> = HashMap::new();
        for s in t
            .sightings
            .iter()
            .filter(|s| s.timestamp >= since)
            .filter(|s| reputation_ok(&t.wallets, &s.wallet, min_reputation))
        {
            let agg = by_mint.entry(s.mint.as_str()).or_insert_with(|| Agg {
                symbol: &s.symbol,
                wallets: HashSet::new(),
                volume: Decimal::ZERO,
                last_seen: s.timestamp,
            });
            agg.wallets.insert(&s.wallet);
            agg.volume += s.sol_amount;
            if s.timestamp >= agg.last_seen {
                agg.last_seen = s.timestamp;
                agg.symbol = &s.symbol;
            }
        }

        let mut rows: Vec<TopToken> = by_mint
            .into_iter()
            .map(|(mint, agg)| TopToken {
                mint: mint.to_string(),
                symbol: agg.symbol.to_string(),
                whale_count: agg.wallets.len() as i64,
                total_volume_sol: agg.volume,
                last_seen: agg.last_seen,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.whale_count
                .cmp(&a.whale_count)
                .then(b.total_volume_sol.cmp(&a.total_volume_sol))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[async_trait]
impl CreatorRepo for MemoryStore {
    async fn upsert_token(
        &self,
        mint: &str,
        creator_wallet: &str,
        name: &str,
        symbol: &str,
        image_uri: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut t = self.inner.lock().await;
        let entry = t.tokens.entry(mint.to_string()).or_insert_with(|| TokenCreator {
            mint: mint.to_string(),
            creator_wallet: String::new(),
            name: String::new(),
            symbol: String::new(),
            image_uri: None,
            rugged: false,
            created_at: Utc::now(),
        });
        entry.creator_wallet = creator_wallet.to_string();
        entry.name = name.to_string();
        entry.symbol = symbol.to_string();
        entry.image_uri = image_uri.map(str::to_string);
        Ok(())
    }

    async fn get_token(&self, mint: &str) -> anyhow::Result<Option<TokenCreator>> {
        Ok(self.inner.lock().await.tokens.get(mint).cloned())
    }

    async fn mark_rugged(&self, mint: &str) -> anyhow::Result<()> {
        if let Some(token) = self.inner.lock().await.tokens.get_mut(mint) {
            token.rugged = true;
        }
        Ok(())
    }
}

#[async_trait]
impl TreasuryRepo for MemoryStore {
    async fn pot_balances(&self) -> anyhow::Result<PotBalances> {
        let t = self.inner.lock().await;
        Ok(PotBalances {
            burn_pot: t.pots.get(pot::BURN).copied().unwrap_or(Decimal::ZERO),
            lp_pot: t.pots.get(pot::LP).copied().unwrap_or(Decimal::ZERO),
        })
    }

    async fn accrue_pot(&self, name: &str, amount: Decimal) -> anyhow::Result<Decimal> {
        let mut t = self.inner.lock().await;
        let balance = t.pots.entry(name.to_string()).or_insert(Decimal::ZERO);
        *balance += amount;
        Ok(*balance)
    }

    async fn spend_pot(&self, name: &str, amount: Decimal) -> anyhow::Result<Decimal> {
        let mut t = self.inner.lock().await;
        let balance = t.pots.entry(name.to_string()).or_insert(Decimal::ZERO);
        *balance = (*balance - amount).max(Decimal::ZERO);
        Ok(*balance)
    }

    async fn log_activity(
        &self,
        activity_type: ActivityType,
        amount: Decimal,
        tx_ref: Option<&str>,
        details: Option<&str>,
    ) -> anyhow::Result<ActivityLog> {
        let entry = ActivityLog {
            id: Uuid::new_v4(),
            activity_type: activity_type.as_str().to_string(),
            amount,
            tx_ref: tx_ref.map(str::to_string),
            details: details.map(str::to_string),
            created_at: Utc::now(),
        };
        self.inner.lock().await.activity.push(entry.clone());
        Ok(entry)
    }

    async fn recent_activity(
        &self,
        limit: i64,
        activity_type: Option<ActivityType>,
    ) -> anyhow::Result<Vec<ActivityLog>> {
        let t = self.inner.lock().await;
        Ok(t.activity
            .iter()
            .rev()
            .filter(|a| activity_type.map_or(true, |ty| a.activity_type == ty.as_str()))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn global_stats(&self) -> anyhow::Result<GlobalStats> {
        let t = self.inner.lock().await;
        let sum = |ty: ActivityType| {
            t.activity
                .iter()
                .filter(|a| a.activity_type == ty.as_str())
                .map(|a| a.amount)
                .sum::<Decimal>()
        };
        Ok(GlobalStats {
            total_burned: sum(ActivityType::Burn),
            total_lp: sum(ActivityType::LpZap),
            total_revshare: sum(ActivityType::Revshare),
            distributions: t
                .activity
                .iter()
                .filter(|a| a.activity_type == ActivityType::Revshare.as_str())
                .count() as i64,
        })
    }
}

#[async_trait]
impl WatchlistRepo for MemoryStore {
    async fn add(&self, address: &str, label: Option<&str>) -> anyhow::Result<WatchlistEntry> {
        let mut t = self.inner.lock().await;
        let entry = t
            .watchlist
            .entry(address.to_string())
            .or_insert_with(|| WatchlistEntry {
                address: address.to_string(),
                label: None,
                added_at: Utc::now(),
            });
        if let Some(label) = label {
            entry.label = Some(label.to_string());
        }
        Ok(entry.clone())
    }

    async fn remove(&self, address: &str) -> anyhow::Result<bool> {
        Ok(self.inner.lock().await.watchlist.remove(address).is_some())
    }

    async fn list(&self) -> anyhow::Result<Vec<WatchlistEntry>> {
        let t = self.inner.lock().await;
        let mut rows: Vec<WatchlistEntry> = t.watchlist.values().cloned().collect();
        rows.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(rows)
    }

    async fn get(&self, address: &str) -> anyhow::Result<Option<WatchlistEntry>> {
        Ok(self.inner.lock().await.watchlist.get(address).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_close_oldest_open_is_fifo() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        let first = store
            .open_position("w1", "m1", Decimal::from(2), t0, t0 + Duration::minutes(10))
            .await
            .unwrap();
        let second = store
            .open_position("w1", "m1", Decimal::from(3), t0, t0 + Duration::minutes(10))
            .await
            .unwrap();

        let closed = store
            .close_oldest_open("w1", "m1", Decimal::from(5), t0 + Duration::minutes(5))
            .await
            .unwrap()
            .expect("position should close");
        assert_eq!(closed.id, first.id);
        assert_eq!(closed.pnl_sol, Some(Decimal::from(3)));

        let closed = store
            .close_oldest_open("w1", "m1", Decimal::from(1), t0 + Duration::minutes(6))
            .await
            .unwrap()
            .expect("second position should close");
        assert_eq!(closed.id, second.id);
        assert_eq!(closed.pnl_sol, Some(Decimal::from(-2)));
    }

    #[tokio::test]
    async fn test_spend_pot_floors_at_zero() {
        let store = MemoryStore::new();
        store.accrue_pot(pot::BURN, Decimal::ONE).await.unwrap();
        let left = store.spend_pot(pot::BURN, Decimal::from(5)).await.unwrap();
        assert_eq!(left, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_recent_activity_filters_by_type() {
        let store = MemoryStore::new();
        store.log_activity(ActivityType::Burn, Decimal::ONE, None, None).await.unwrap();
        store.log_activity(ActivityType::Analysis, Decimal::ZERO, None, Some("x")).await.unwrap();

        let burns = store.recent_activity(10, Some(ActivityType::Burn)).await.unwrap();
        assert_eq!(burns.len(), 1);
        assert_eq!(burns[0].activity_type, "BURN");

        let all = store.recent_activity(10, None).await.unwrap();
        assert_eq!(all[0].activity_type, "ANALYSIS");
    }
}
