use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Market snapshot for the managed token, as sampled by the decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub price: Decimal,
    pub volume_24h: Decimal,
    /// Percent change over the last five minutes (e.g. `-6.2`).
    pub price_change_5m: Decimal,
    pub sampled_at: DateTime<Utc>,
}
