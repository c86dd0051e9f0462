pub mod creator_repo;
pub mod memory;
pub mod position_repo;
pub mod sighting_repo;
pub mod treasury_repo;
pub mod wallet_repo;
pub mod watchlist_repo;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use creator_repo::{CreatorRepo, PgCreatorRepo};
pub use memory::MemoryStore;
pub use position_repo::{ImpactAverages, PgPositionRepo, PositionRepo};
pub use sighting_repo::{PgSightingRepo, SightingRepo};
pub use treasury_repo::{PgTreasuryRepo, TreasuryRepo};
pub use wallet_repo::{PgWalletRepo, WalletRepo};
pub use watchlist_repo::{PgWatchlistRepo, WatchlistRepo};

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// One handle per repository. Components take only the ones they need.
#[derive(Clone)]
pub struct Store {
    pub positions: Arc<dyn PositionRepo>,
    pub wallets: Arc<dyn WalletRepo>,
    pub sightings: Arc<dyn SightingRepo>,
    pub creators: Arc<dyn CreatorRepo>,
    pub treasury: Arc<dyn TreasuryRepo>,
    pub watchlist: Arc<dyn WatchlistRepo>,
    pool: Option<PgPool>,
}

impl Store {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            positions: Arc::new(PgPositionRepo::new(pool.clone())),
            wallets: Arc::new(PgWalletRepo::new(pool.clone())),
            sightings: Arc::new(PgSightingRepo::new(pool.clone())),
            creators: Arc::new(PgCreatorRepo::new(pool.clone())),
            treasury: Arc::new(PgTreasuryRepo::new(pool.clone())),
            watchlist: Arc::new(PgWatchlistRepo::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self::from_memory(MemoryStore::new())
    }

    pub fn from_memory(mem: MemoryStore) -> Self {
        Self {
            positions: Arc::new(mem.clone()),
            wallets: Arc::new(mem.clone()),
            sightings: Arc::new(mem.clone()),
            creators: Arc::new(mem.clone()),
            treasury: Arc::new(mem.clone()),
            watchlist: Arc::new(mem),
            pool: None,
        }
    }

    /// Connectivity check for the health endpoint. Always succeeds in memory.
    pub async fn ping(&self) -> bool {
        match &self.pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => true,
        }
    }
}
