use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::ingestion::feed::PUMPPORTAL_WS_URL;

const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const DEFAULT_DEXSCREENER_URL: &str = "https://api.dexscreener.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Stream
    pub pumpportal_ws_url: String,
    pub whale_threshold_sol: Decimal,
    /// Empty means follow every newly created mint.
    pub tracked_mints: Vec<String>,
    pub token_cache_capacity: usize,

    // Treasury (optional — all three identities are needed to spend)
    pub token_mint: Option<String>,
    pub treasury_wallet: Option<String>,
    pub ops_wallet: Option<String>,
    pub solana_rpc_url: String,
    pub dexscreener_url: String,
    pub fee_threshold_sol: Decimal,
    pub fee_reserve_sol: Decimal,
    pub fee_poll_interval_secs: u64,
    pub decision_interval_secs: u64,
    pub revshare_min_share: Decimal,
    pub revshare_batch_size: usize,
    pub dry_run: bool,

    // Query surface
    pub verified_min_reputation: i32,
    pub api_token: Option<String>,

    // Notifications
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let tracked_mints: Vec<String> = env::var("TRACKED_MINTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            pumpportal_ws_url: env::var("PUMPPORTAL_WS_URL")
                .unwrap_or_else(|_| PUMPPORTAL_WS_URL.into()),
            whale_threshold_sol: parse_or("WHALE_THRESHOLD_SOL", Decimal::ONE),
            tracked_mints,
            token_cache_capacity: parse_or("TOKEN_CACHE_CAPACITY", 5_000),

            token_mint: non_empty_var("TOKEN_MINT"),
            treasury_wallet: non_empty_var("TREASURY_WALLET"),
            ops_wallet: non_empty_var("OPS_WALLET"),
            solana_rpc_url: env::var("SOLANA_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.into()),
            dexscreener_url: env::var("DEXSCREENER_URL")
                .unwrap_or_else(|_| DEFAULT_DEXSCREENER_URL.into()),
            fee_threshold_sol: parse_or("FEE_THRESHOLD_SOL", Decimal::new(3, 1)),
            fee_reserve_sol: parse_or("FEE_RESERVE_SOL", Decimal::new(1, 2)),
            fee_poll_interval_secs: parse_or("FEE_POLL_INTERVAL_SECS", 60),
            decision_interval_secs: parse_or("DECISION_INTERVAL_SECS", 300),
            revshare_min_share: parse_or("REVSHARE_MIN_SHARE", Decimal::new(5, 4)),
            revshare_batch_size: parse_or("REVSHARE_BATCH_SIZE", 15),
            dry_run: parse_or("DRY_RUN", true),

            verified_min_reputation: parse_or("VERIFIED_MIN_REPUTATION", 70),
            api_token: non_empty_var("API_TOKEN"),

            telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: non_empty_var("TELEGRAM_CHAT_ID"),
        })
    }

    /// Treasury spending needs the managed mint plus both wallets.
    pub fn treasury_enabled(&self) -> bool {
        self.token_mint.is_some() && self.treasury_wallet.is_some() && self.ops_wallet.is_some()
    }

    /// Defaults for everything; used by tests and tooling.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 8080,
            pumpportal_ws_url: PUMPPORTAL_WS_URL.into(),
            whale_threshold_sol: Decimal::ONE,
            tracked_mints: Vec::new(),
            token_cache_capacity: 5_000,
            token_mint: None,
            treasury_wallet: None,
            ops_wallet: None,
            solana_rpc_url: DEFAULT_RPC_URL.into(),
            dexscreener_url: DEFAULT_DEXSCREENER_URL.into(),
            fee_threshold_sol: Decimal::new(3, 1),
            fee_reserve_sol: Decimal::new(1, 2),
            fee_poll_interval_secs: 60,
            decision_interval_secs: 300,
            revshare_min_share: Decimal::new(5, 4),
            revshare_batch_size: 15,
            dry_run: true,
            verified_min_reputation: 70,
            api_token: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparseable config value, using default");
            default
        }),
        Err(_) => default,
    }
}
