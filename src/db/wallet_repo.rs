use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::TrackedWallet;

#[async_trait]
pub trait WalletRepo: Send + Sync {
    /// Fetch a tracked wallet by its address.
    async fn get_wallet(&self, address: &str) -> anyhow::Result<Option<TrackedWallet>>;

    /// Insert or fully overwrite the aggregate row for a wallet.
    async fn save_wallet(&self, wallet: &TrackedWallet) -> anyhow::Result<()>;

    /// Wallets ordered by reputation, then total profit.
    async fn leaderboard(&self, limit: i64) -> anyhow::Result<Vec<TrackedWallet>>;

    /// Reputation scores for the given addresses; unseen wallets are absent.
    async fn reputations(&self, addresses: &[String]) -> anyhow::Result<HashMap<String, i32>>;
}

pub struct PgWalletRepo {
    pool: PgPool,
}

impl PgWalletRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepo for PgWalletRepo {
    async fn get_wallet(&self, address: &str) -> anyhow::Result<Option<TrackedWallet>> {
        let wallet = sqlx::query_as::<_, TrackedWallet>(
            "SELECT * FROM tracked_wallets WHERE address = $1",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    async fn save_wallet(&self, w: &TrackedWallet) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tracked_wallets (
                address, wins, losses, total_trades, total_profit_sol, win_rate,
                reputation_score, avg_impact_volume, avg_impact_buyers, max_win_sol, last_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (address) DO UPDATE
            SET wins = $2,
                losses = $3,
                total_trades = $4,
                total_profit_sol = $5,
                win_rate = $6,
                reputation_score = $7,
                avg_impact_volume = $8,
                avg_impact_buyers = $9,
                max_win_sol = $10,
                last_active = $11
            "#,
        )
        .bind(&w.address)
        .bind(w.wins)
        .bind(w.losses)
        .bind(w.total_trades)
        .bind(w.total_profit_sol)
        .bind(w.win_rate)
        .bind(w.reputation_score)
        .bind(w.avg_impact_volume)
        .bind(w.avg_impact_buyers)
        .bind(w.max_win_sol)
        .bind(w.last_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn leaderboard(&self, limit: i64) -> anyhow::Result<Vec<TrackedWallet>> {
        let wallets = sqlx::query_as::<_, TrackedWallet>(
            r#"
            SELECT * FROM tracked_wallets
            ORDER BY reputation_score DESC, total_profit_sol DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(wallets)
    }

    async fn reputations(&self, addresses: &[String]) -> anyhow::Result<HashMap<String, i32>> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i32)> = sqlx::query_as(
            "SELECT address, reputation_score FROM tracked_wallets WHERE address = ANY($1)",
        )
        .bind(addresses)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }
}
