pub mod event;
pub mod market;
pub mod position;
pub mod sighting;
pub mod token;
pub mod treasury;
pub mod wallet;

pub use event::TrackerEvent;
pub use market::MarketData;
pub use position::{Position, PositionStatus};
pub use sighting::{NewSighting, TopToken, WhaleSighting};
pub use token::{TokenCreator, WatchlistEntry};
pub use treasury::{
    ActivityLog, ActivityType, AiDecision, GlobalStats, PotBalances, TreasuryAction,
    TreasuryReserves,
};
pub use wallet::TrackedWallet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// FeedEvent — core pipeline message
// ---------------------------------------------------------------------------

/// A validated event from the trade stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedEvent {
    Create(TokenCreated),
    Buy(TradeEvent),
    Sell(TradeEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCreated {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub creator_wallet: String,
    pub image_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub mint: String,
    pub wallet: String,
    pub sol_amount: Decimal,
    pub market_cap_sol: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl FeedEvent {
    pub fn mint(&self) -> &str {
        match self {
            FeedEvent::Create(c) => &c.mint,
            FeedEvent::Buy(t) | FeedEvent::Sell(t) => &t.mint,
        }
    }
}

impl fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedEvent::Create(c) => write!(
                f,
                "Create: mint={} symbol={} creator={}",
                short(&c.mint),
                c.symbol,
                short(&c.creator_wallet),
            ),
            FeedEvent::Buy(t) => write!(
                f,
                "Buy: mint={} wallet={} sol={}",
                short(&t.mint),
                short(&t.wallet),
                t.sol_amount,
            ),
            FeedEvent::Sell(t) => write!(
                f,
                "Sell: mint={} wallet={} sol={}",
                short(&t.mint),
                short(&t.wallet),
                t.sol_amount,
            ),
        }
    }
}

/// First 8 characters of an address, for log lines.
pub fn short(addr: &str) -> &str {
    addr.char_indices().nth(8).map_or(addr, |(i, _)| &addr[..i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_truncates_on_char_boundary() {
        assert_eq!(short("PumpMint1111111111"), "PumpMint");
        assert_eq!(short("abc"), "abc");
        assert_eq!(short("€€€€"), "€€€€");
        assert_eq!(short("€€€€€€€€€€"), "€€€€€€€€");
    }
}
