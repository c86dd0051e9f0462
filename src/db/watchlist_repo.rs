use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::WatchlistEntry;

#[async_trait]
pub trait WatchlistRepo: Send + Sync {
    /// Add (or relabel) an address.
    async fn add(&self, address: &str, label: Option<&str>) -> anyhow::Result<WatchlistEntry>;

    /// Returns true if the address was present.
    async fn remove(&self, address: &str) -> anyhow::Result<bool>;

    async fn list(&self) -> anyhow::Result<Vec<WatchlistEntry>>;

    async fn get(&self, address: &str) -> anyhow::Result<Option<WatchlistEntry>>;
}

pub struct PgWatchlistRepo {
    pool: PgPool,
}

impl PgWatchlistRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WatchlistRepo for PgWatchlistRepo {
    async fn add(&self, address: &str, label: Option<&str>) -> anyhow::Result<WatchlistEntry> {
        let entry = sqlx::query_as::<_, WatchlistEntry>(
            r#"
            INSERT INTO watchlist (address, label)
            VALUES ($1, $2)
            ON CONFLICT (address) DO UPDATE SET label = COALESCE($2, watchlist.label)
            RETURNING *
            "#,
        )
        .bind(address)
        .bind(label)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn remove(&self, address: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM watchlist WHERE address = $1")
            .bind(address)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> anyhow::Result<Vec<WatchlistEntry>> {
        let entries = sqlx::query_as::<_, WatchlistEntry>(
            "SELECT * FROM watchlist ORDER BY added_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn get(&self, address: &str) -> anyhow::Result<Option<WatchlistEntry>> {
        let entry = sqlx::query_as::<_, WatchlistEntry>(
            "SELECT * FROM watchlist WHERE address = $1",
        )
        .bind(address)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }
}
