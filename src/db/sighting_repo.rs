use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewSighting, TopToken, WhaleSighting};

#[async_trait]
pub trait SightingRepo: Send + Sync {
    async fn insert_sighting(&self, sighting: &NewSighting) -> anyhow::Result<WhaleSighting>;

    /// Newest-first sightings. With `min_reputation`, only sightings whose wallet
    /// has at least that reputation are returned.
    async fn recent_sightings(
        &self,
        limit: i64,
        min_reputation: Option<i32>,
    ) -> anyhow::Result<Vec<WhaleSighting>>;

    /// Number of whale buy sightings on `mint` with `since <= timestamp <= until`.
    async fn count_whale_buys(
        &self,
        mint: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<i64>;

    /// Mean reputation (floored) of tracked wallets sighted buying `mint` in the window.
    async fn pod_reputation(
        &self,
        mint: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<Option<i32>>;

    /// Per-mint aggregate of sightings since `since`, by distinct whale count then volume.
    async fn top_tokens(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        min_reputation: Option<i32>,
    ) -> anyhow::Result<Vec<TopToken>>;
}

pub struct PgSightingRepo {
    pool: PgPool,
}

impl PgSightingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SightingRepo for PgSightingRepo {
    async fn insert_sighting(&self, s: &NewSighting) -> anyhow::Result<WhaleSighting> {
        let row = sqlx::query_as::<_, WhaleSighting>(
            r#"
            INSERT INTO whale_sightings
                (id, mint, symbol, image_uri, sol_amount, wallet, is_buy, timestamp, market_cap, pod_reputation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&s.mint)
        .bind(&s.symbol)
        .bind(&s.image_uri)
        .bind(s.sol_amount)
        .bind(&s.wallet)
        .bind(s.is_buy)
        .bind(s.timestamp)
        .bind(s.market_cap)
        .bind(s.pod_reputation)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn recent_sightings(
        &self,
        limit: i64,
        min_reputation: Option<i32>,
    ) -> anyhow::Result<Vec<WhaleSighting>> {
        let rows = match min_reputation {
            Some(min) => {
                sqlx::query_as::<_, WhaleSighting>(
                    r#"
                    SELECT s.* FROM whale_sightings s
                    JOIN tracked_wallets w ON w.address = s.wallet
                    WHERE w.reputation_score >= $2
                    ORDER BY s.timestamp DESC
                    LIMIT $1
                    "#,
                )
                .bind(limit)
                .bind(min)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, WhaleSighting>(
                    "SELECT * FROM whale_sightings ORDER BY timestamp DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows)
    }

    async fn count_whale_buys(
        &self,
        mint: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM whale_sightings
            WHERE mint = $1 AND is_buy AND timestamp >= $2 AND timestamp <= $3
            "#,
        )
        .bind(mint)
        .bind(since)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn pod_reputation(
        &self,
        mint: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> anyhow::Result<Option<i32>> {
        let row: (Option<i32>,) = sqlx::query_as(
            r#"
            SELECT FLOOR(AVG(w.reputation_score))::int
            FROM tracked_wallets w
            WHERE w.address IN (
                SELECT DISTINCT wallet FROM whale_sightings
                WHERE mint = $1 AND is_buy AND timestamp >= $2 AND timestamp <= $3
            )
            "#,
        )
        .bind(mint)
        .bind(since)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn top_tokens(
        &self,
        since: DateTime<Utc>,
        limit: i64,
        min_reputation: Option<i32>,
    ) -> anyhow::Result<Vec<TopToken>> {
        let rows = sqlx::query_as::<_, TopToken>(
            r#"
            SELECT s.mint,
                   (ARRAY_AGG(s.symbol ORDER BY s.timestamp DESC))[1] AS symbol,
                   COUNT(DISTINCT s.wallet) AS whale_count,
                   SUM(s.sol_amount) AS total_volume_sol,
                   MAX(s.timestamp) AS last_seen
            FROM whale_sightings s
            LEFT JOIN tracked_wallets w ON w.address = s.wallet
            WHERE s.timestamp >= $1
              AND ($3::int IS NULL OR w.reputation_score >= $3)
            GROUP BY s.mint
            ORDER BY whale_count DESC, total_volume_sol DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit)
        .bind(min_reputation)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
