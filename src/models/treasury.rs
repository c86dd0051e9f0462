use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Activity ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Burn,
    LpZap,
    Revshare,
    FeeClaim,
    Analysis,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Burn => "BURN",
            ActivityType::LpZap => "LP_ZAP",
            ActivityType::Revshare => "REVSHARE",
            ActivityType::FeeClaim => "FEE_CLAIM",
            ActivityType::Analysis => "ANALYSIS",
        }
    }

    /// Parse the stored/API form. `HARVEST` is accepted as an alias of `FEE_CLAIM`.
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BURN" => Some(ActivityType::Burn),
            "LP_ZAP" => Some(ActivityType::LpZap),
            "REVSHARE" => Some(ActivityType::Revshare),
            "FEE_CLAIM" | "HARVEST" => Some(ActivityType::FeeClaim),
            "ANALYSIS" => Some(ActivityType::Analysis),
            _ => None,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for activity_logs table. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLog {
    pub id: Uuid,
    pub activity_type: String,
    pub amount: Decimal,
    pub tx_ref: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Pots
// ---------------------------------------------------------------------------

pub mod pot {
    pub const BURN: &str = "burn_pot";
    pub const LP: &str = "lp_pot";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PotBalances {
    pub burn_pot: Decimal,
    pub lp_pot: Decimal,
}

impl PotBalances {
    pub fn total(&self) -> Decimal {
        self.burn_pot + self.lp_pot
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreasuryAction {
    BuyBurn,
    AddLp,
    Wait,
}

impl TreasuryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreasuryAction::BuyBurn => "BUY_BURN",
            TreasuryAction::AddLp => "ADD_LP",
            TreasuryAction::Wait => "WAIT",
        }
    }
}

impl fmt::Display for TreasuryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest output of the market decision engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiDecision {
    pub action: TreasuryAction,
    pub reason: String,
    /// 0.0 - 1.0
    pub confidence: Decimal,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Read-side aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_burned: Decimal,
    pub total_lp: Decimal,
    pub total_revshare: Decimal,
    pub distributions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryReserves {
    pub total_balance: Option<Decimal>,
    pub burn_pot: Decimal,
    pub lp_pot: Decimal,
    /// total - pots, floored at zero. `None` when the balance is unavailable.
    pub operational: Option<Decimal>,
}
