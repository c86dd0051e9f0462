use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for token_creators table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenCreator {
    pub mint: String,
    pub creator_wallet: String,
    pub name: String,
    pub symbol: String,
    pub image_uri: Option<String>,
    pub rugged: bool,
    pub created_at: DateTime<Utc>,
}

/// Database row for watchlist table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchlistEntry {
    pub address: String,
    pub label: Option<String>,
    pub added_at: DateTime<Utc>,
}
