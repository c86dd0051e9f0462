pub mod dexscreener;

use async_trait::async_trait;

use crate::models::MarketData;

pub use dexscreener::DexScreenerFeed;

/// Market snapshot provider for one mint. `None` means the feed is
/// unavailable; callers degrade instead of failing.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn sample(&self, mint: &str) -> Option<MarketData>;
}
