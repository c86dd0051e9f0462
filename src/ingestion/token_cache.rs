use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::db::CreatorRepo;

const FALLBACK_CAPACITY: NonZeroUsize = match NonZeroUsize::new(5_000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Display metadata for a mint.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMeta {
    pub name: String,
    pub symbol: String,
    pub image_uri: Option<String>,
}

impl TokenMeta {
    pub fn unknown() -> Self {
        Self {
            name: String::new(),
            symbol: "UNKNOWN".to_string(),
            image_uri: None,
        }
    }
}

/// Bounded mint -> metadata cache in front of the token_creators table.
pub struct TokenCache {
    entries: Mutex<LruCache<String, TokenMeta>>,
    creators: Arc<dyn CreatorRepo>,
}

impl TokenCache {
    pub fn new(capacity: usize, creators: Arc<dyn CreatorRepo>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(FALLBACK_CAPACITY);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            creators,
        }
    }

    pub async fn insert(&self, mint: &str, meta: TokenMeta) {
        self.entries.lock().await.put(mint.to_string(), meta);
    }

    /// Cached entry, else the persisted creator row, else `UNKNOWN`.
    /// Storage errors degrade to `UNKNOWN` without being cached.
    pub async fn resolve(&self, mint: &str) -> TokenMeta {
        if let Some(meta) = self.entries.lock().await.get(mint) {
            return meta.clone();
        }

        match self.creators.get_token(mint).await {
            Ok(Some(token)) => {
                let meta = TokenMeta {
                    name: token.name,
                    symbol: token.symbol,
                    image_uri: token.image_uri,
                };
                self.insert(mint, meta.clone()).await;
                meta
            }
            Ok(None) => TokenMeta::unknown(),
            Err(e) => {
                tracing::warn!(mint = %mint, error = %e, "Token lookup failed");
                TokenMeta::unknown()
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
