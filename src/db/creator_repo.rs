use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::TokenCreator;

#[async_trait]
pub trait CreatorRepo: Send + Sync {
    /// Record mint → creator (idempotent; metadata refreshed on repeat).
    async fn upsert_token(
        &self,
        mint: &str,
        creator_wallet: &str,
        name: &str,
        symbol: &str,
        image_uri: Option<&str>,
    ) -> anyhow::Result<()>;

    async fn get_token(&self, mint: &str) -> anyhow::Result<Option<TokenCreator>>;

    async fn mark_rugged(&self, mint: &str) -> anyhow::Result<()>;
}

pub struct PgCreatorRepo {
    pool: PgPool,
}

impl PgCreatorRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreatorRepo for PgCreatorRepo {
    async fn upsert_token(
        &self,
        mint: &str,
        creator_wallet: &str,
        name: &str,
        symbol: &str,
        image_uri: Option<&str>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO token_creators (mint, creator_wallet, name, symbol, image_uri)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (mint) DO UPDATE
            SET creator_wallet = $2, name = $3, symbol = $4, image_uri = $5
            "#,
        )
        .bind(mint)
        .bind(creator_wallet)
        .bind(name)
        .bind(symbol)
        .bind(image_uri)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_token(&self, mint: &str) -> anyhow::Result<Option<TokenCreator>> {
        let token = sqlx::query_as::<_, TokenCreator>(
            "SELECT * FROM token_creators WHERE mint = $1",
        )
        .bind(mint)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn mark_rugged(&self, mint: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE token_creators SET rugged = true WHERE mint = $1")
            .bind(mint)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
