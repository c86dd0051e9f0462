use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::Position;

/// Mean impact figures across every position a wallet has held.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImpactAverages {
    pub avg_volume: Decimal,
    pub avg_buyers: Decimal,
}

#[async_trait]
pub trait PositionRepo: Send + Sync {
    /// Open a new position for (wallet, mint).
    async fn open_position(
        &self,
        wallet: &str,
        mint: &str,
        buy_amount_sol: Decimal,
        buy_timestamp: DateTime<Utc>,
        monitoring_expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Position>;

    /// Credit a follower buy to every open, still-monitored position on `mint`
    /// held by a wallet other than `buyer`. Returns the number of positions credited.
    async fn accrue_impact(
        &self,
        mint: &str,
        buyer: &str,
        amount_sol: Decimal,
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64>;

    /// Close the oldest open position for (wallet, mint), if any.
    /// `pnl_sol` is set to `sell_amount_sol - buy_amount_sol`.
    async fn close_oldest_open(
        &self,
        wallet: &str,
        mint: &str,
        sell_amount_sol: Decimal,
        sell_timestamp: DateTime<Utc>,
    ) -> anyhow::Result<Option<Position>>;

    async fn get_open_positions(&self, limit: i64) -> anyhow::Result<Vec<Position>>;

    async fn get_positions_by_wallet(&self, wallet: &str, limit: i64) -> anyhow::Result<Vec<Position>>;

    async fn impact_averages(&self, wallet: &str) -> anyhow::Result<ImpactAverages>;

    async fn count_open_positions(&self) -> anyhow::Result<i64>;
}

pub struct PgPositionRepo {
    pool: PgPool,
}

impl PgPositionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PositionRepo for PgPositionRepo {
    async fn open_position(
        &self,
        wallet: &str,
        mint: &str,
        buy_amount_sol: Decimal,
        buy_timestamp: DateTime<Utc>,
        monitoring_expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Position> {
        let pos = sqlx::query_as::<_, Position>(
            r#"
            INSERT INTO positions (wallet, mint, buy_amount_sol, buy_timestamp, monitoring_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(wallet)
        .bind(mint)
        .bind(buy_amount_sol)
        .bind(buy_timestamp)
        .bind(monitoring_expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(pos)
    }

    async fn accrue_impact(
        &self,
        mint: &str,
        buyer: &str,
        amount_sol: Decimal,
        at: DateTime<Utc>,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE positions
            SET impact_volume = impact_volume + $3,
                impact_buyers = impact_buyers + 1
            WHERE mint = $1
              AND wallet <> $2
              AND status = 'OPEN'
              AND monitoring_expires_at > $4
            "#,
        )
        .bind(mint)
        .bind(buyer)
        .bind(amount_sol)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn close_oldest_open(
        &self,
        wallet: &str,
        mint: &str,
        sell_amount_sol: Decimal,
        sell_timestamp: DateTime<Utc>,
    ) -> anyhow::Result<Option<Position>> {
        // Row lock on the selected position serializes concurrent closes of the same pair.
        let pos = sqlx::query_as::<_, Position>(
            r#"
            UPDATE positions
            SET status = 'CLOSED',
                sell_amount_sol = $3,
                sell_timestamp = $4,
                pnl_sol = $3 - buy_amount_sol
            WHERE id = (
                SELECT id FROM positions
                WHERE wallet = $1 AND mint = $2 AND status = 'OPEN'
                ORDER BY id ASC
                LIMIT 1
                FOR UPDATE
            )
            AND status = 'OPEN'
            RETURNING *
            "#,
        )
        .bind(wallet)
        .bind(mint)
        .bind(sell_amount_sol)
        .bind(sell_timestamp)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pos)
    }

    async fn get_open_positions(&self, limit: i64) -> anyhow::Result<Vec<Position>> {
        let positions = sqlx::query_as::<_, Position>(
            "SELECT * FROM positions WHERE status = 'OPEN' ORDER BY buy_timestamp DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(positions)
    }

    async fn get_positions_by_wallet(&self, wallet: &str, limit: i64) -> anyhow::Result<Vec<Position>> {
        let positions = sqlx::query_as::<_, Position>(
            "SELECT * FROM positions WHERE wallet = $1 ORDER BY buy_timestamp DESC, id DESC LIMIT $2",
        )
        .bind(wallet)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(positions)
    }

    async fn impact_averages(&self, wallet: &str) -> anyhow::Result<ImpactAverages> {
        let row: (Option<Decimal>, Option<Decimal>) = sqlx::query_as(
            r#"
            SELECT AVG(impact_volume), AVG(impact_buyers::numeric)
            FROM positions
            WHERE wallet = $1
            "#,
        )
        .bind(wallet)
        .fetch_one(&self.pool)
        .await?;

        Ok(ImpactAverages {
            avg_volume: row.0.unwrap_or(Decimal::ZERO),
            avg_buyers: row.1.unwrap_or(Decimal::ZERO),
        })
    }

    async fn count_open_positions(&self) -> anyhow::Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM positions WHERE status = 'OPEN'")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}
