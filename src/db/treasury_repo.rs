use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::treasury::pot;
use crate::models::{ActivityLog, ActivityType, GlobalStats, PotBalances};

#[async_trait]
pub trait TreasuryRepo: Send + Sync {
    async fn pot_balances(&self) -> anyhow::Result<PotBalances>;

    /// Atomically add `amount` to a pot. Returns the new balance.
    async fn accrue_pot(&self, name: &str, amount: Decimal) -> anyhow::Result<Decimal>;

    /// Atomically subtract `amount` from a pot, flooring at zero. Returns the new balance.
    async fn spend_pot(&self, name: &str, amount: Decimal) -> anyhow::Result<Decimal>;

    async fn log_activity(
        &self,
        activity_type: ActivityType,
        amount: Decimal,
        tx_ref: Option<&str>,
        details: Option<&str>,
    ) -> anyhow::Result<ActivityLog>;

    /// Newest-first ledger entries, optionally of one type.
    async fn recent_activity(
        &self,
        limit: i64,
        activity_type: Option<ActivityType>,
    ) -> anyhow::Result<Vec<ActivityLog>>;

    async fn global_stats(&self) -> anyhow::Result<GlobalStats>;
}

pub struct PgTreasuryRepo {
    pool: PgPool,
}

impl PgTreasuryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TreasuryRepo for PgTreasuryRepo {
    async fn pot_balances(&self) -> anyhow::Result<PotBalances> {
        let rows: Vec<(String, Decimal)> = sqlx::query_as("SELECT name, balance FROM virtual_pots")
            .fetch_all(&self.pool)
            .await?;

        let mut pots = PotBalances::default();
        for (name, balance) in rows {
            match name.as_str() {
                pot::BURN => pots.burn_pot = balance,
                pot::LP => pots.lp_pot = balance,
                _ => {}
            }
        }

        Ok(pots)
    }

    async fn accrue_pot(&self, name: &str, amount: Decimal) -> anyhow::Result<Decimal> {
        let row: (Decimal,) = sqlx::query_as(
            r#"
            INSERT INTO virtual_pots (name, balance, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (name) DO UPDATE
            SET balance = virtual_pots.balance + $2, updated_at = NOW()
            RETURNING balance
            "#,
        )
        .bind(name)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn spend_pot(&self, name: &str, amount: Decimal) -> anyhow::Result<Decimal> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE virtual_pots
            SET balance = GREATEST(balance - $2, 0), updated_at = NOW()
            WHERE name = $1
            RETURNING balance
            "#,
        )
        .bind(name)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.0).unwrap_or(Decimal::ZERO))
    }

    async fn log_activity(
        &self,
        activity_type: ActivityType,
        amount: Decimal,
        tx_ref: Option<&str>,
        details: Option<&str>,
    ) -> anyhow::Result<ActivityLog> {
        let entry = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (id, activity_type, amount, tx_ref, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(activity_type.as_str())
        .bind(amount)
        .bind(tx_ref)
        .bind(details)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn recent_activity(
        &self,
        limit: i64,
        activity_type: Option<ActivityType>,
    ) -> anyhow::Result<Vec<ActivityLog>> {
        let entries = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT * FROM activity_logs
            WHERE ($2::text IS NULL OR activity_type = $2)
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(activity_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn global_stats(&self) -> anyhow::Result<GlobalStats> {
        let row: (Option<Decimal>, Option<Decimal>, Option<Decimal>, i64) = sqlx::query_as(
            r#"
            SELECT
                SUM(amount) FILTER (WHERE activity_type = 'BURN'),
                SUM(amount) FILTER (WHERE activity_type = 'LP_ZAP'),
                SUM(amount) FILTER (WHERE activity_type = 'REVSHARE'),
                COUNT(*) FILTER (WHERE activity_type = 'REVSHARE')
            FROM activity_logs
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(GlobalStats {
            total_burned: row.0.unwrap_or(Decimal::ZERO),
            total_lp: row.1.unwrap_or(Decimal::ZERO),
            total_revshare: row.2.unwrap_or(Decimal::ZERO),
            distributions: row.3,
        })
    }
}
