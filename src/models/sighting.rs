use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for whale_sightings table. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WhaleSighting {
    pub id: Uuid,
    pub mint: String,
    pub symbol: String,
    pub image_uri: Option<String>,
    pub sol_amount: Decimal,
    pub wallet: String,
    pub is_buy: bool,
    pub timestamp: DateTime<Utc>,
    pub market_cap: Option<Decimal>,
    pub pod_reputation: Option<i32>,
}

/// Insert payload for a new sighting.
#[derive(Debug, Clone)]
pub struct NewSighting {
    pub mint: String,
    pub symbol: String,
    pub image_uri: Option<String>,
    pub sol_amount: Decimal,
    pub wallet: String,
    pub is_buy: bool,
    pub timestamp: DateTime<Utc>,
    pub market_cap: Option<Decimal>,
    pub pod_reputation: Option<i32>,
}

impl NewSighting {
    pub fn into_row(self, id: Uuid) -> WhaleSighting {
        WhaleSighting {
            id,
            mint: self.mint,
            symbol: self.symbol,
            image_uri: self.image_uri,
            sol_amount: self.sol_amount,
            wallet: self.wallet,
            is_buy: self.is_buy,
            timestamp: self.timestamp,
            market_cap: self.market_cap,
            pod_reputation: self.pod_reputation,
        }
    }
}

/// Per-mint whale activity aggregate over a time window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TopToken {
    pub mint: String,
    pub symbol: String,
    pub whale_count: i64,
    pub total_volume_sol: Decimal,
    pub last_seen: DateTime<Utc>,
}
