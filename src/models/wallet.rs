use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for tracked_wallets table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrackedWallet {
    pub address: String,
    pub wins: i32,
    pub losses: i32,
    pub total_trades: i32,
    pub total_profit_sol: Decimal,
    /// Percentage, 0-100.
    pub win_rate: Decimal,
    pub reputation_score: i32,
    pub avg_impact_volume: Decimal,
    pub avg_impact_buyers: Decimal,
    pub max_win_sol: Decimal,
    pub last_active: DateTime<Utc>,
}

impl TrackedWallet {
    /// Fresh record for a wallet seen closing its first position.
    pub fn new(address: &str, at: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            wins: 0,
            losses: 0,
            total_trades: 0,
            total_profit_sol: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            reputation_score: 50,
            avg_impact_volume: Decimal::ZERO,
            avg_impact_buyers: Decimal::ZERO,
            max_win_sol: Decimal::ZERO,
            last_active: at,
        }
    }
}
