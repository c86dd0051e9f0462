use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Database row for positions table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Position {
    pub id: i64,
    pub wallet: String,
    pub mint: String,
    pub buy_amount_sol: Decimal,
    pub buy_timestamp: DateTime<Utc>,
    pub status: String,
    pub sell_amount_sol: Option<Decimal>,
    pub sell_timestamp: Option<DateTime<Utc>>,
    pub pnl_sol: Option<Decimal>,
    pub monitoring_expires_at: DateTime<Utc>,
    pub impact_volume: Decimal,
    pub impact_buyers: i32,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open.as_str()
    }

    /// Whether a buy at `at` still falls inside this position's impact window.
    pub fn is_monitoring(&self, at: DateTime<Utc>) -> bool {
        self.is_open() && at < self.monitoring_expires_at
    }

    /// Hold duration in minutes, up to the sell or up to `now` when still open.
    pub fn hold_minutes(&self, now: DateTime<Utc>) -> Decimal {
        let end = self.sell_timestamp.unwrap_or(now);
        let millis = (end - self.buy_timestamp).num_milliseconds();
        Decimal::from(millis) / Decimal::from(60_000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
