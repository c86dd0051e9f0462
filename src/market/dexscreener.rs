use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::models::MarketData;

use super::MarketDataSource;

#[derive(Debug, Clone, Deserialize)]
pub struct PriceChange {
    pub m5: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Volume {
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DexPair {
    #[serde(rename = "pairAddress")]
    pub pair_address: String,
    #[serde(rename = "priceUsd")]
    pub price_usd: Option<String>,
    #[serde(rename = "priceChange")]
    pub price_change: Option<PriceChange>,
    pub volume: Option<Volume>,
    pub liquidity: Option<Liquidity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPairsResponse {
    pub pairs: Option<Vec<DexPair>>,
}

/// DexScreener-backed market sampler.
#[derive(Debug, Clone)]
pub struct DexScreenerFeed {
    http: Client,
    base_url: String,
}

impl DexScreenerFeed {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch_pairs(&self, mint: &str) -> anyhow::Result<Vec<DexPair>> {
        let url = format!("{}/latest/dex/tokens/{}", self.base_url, mint);
        let resp: TokenPairsResponse = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.pairs.unwrap_or_default())
    }
}

/// Pick the deepest pool and map it to a snapshot. Pairs without a price are
/// skipped.
pub fn to_market_data(pairs: &[DexPair]) -> Option<MarketData> {
    let liquidity = |p: &DexPair| p.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);

    let best = pairs
        .iter()
        .filter(|p| p.price_usd.is_some())
        .max_by(|a, b| liquidity(a).total_cmp(&liquidity(b)))?;

    let price = best.price_usd.as_deref()?.parse::<Decimal>().ok()?;
    let volume_24h = best
        .volume
        .as_ref()
        .and_then(|v| v.h24)
        .and_then(Decimal::from_f64)
        .unwrap_or(Decimal::ZERO);
    let price_change_5m = best
        .price_change
        .as_ref()
        .and_then(|c| c.m5)
        .and_then(Decimal::from_f64)
        .unwrap_or(Decimal::ZERO);

    Some(MarketData {
        price,
        volume_24h,
        price_change_5m,
        sampled_at: Utc::now(),
    })
}

#[async_trait]
impl MarketDataSource for DexScreenerFeed {
    async fn sample(&self, mint: &str) -> Option<MarketData> {
        match self.fetch_pairs(mint).await {
            Ok(pairs) => {
                let data = to_market_data(&pairs);
                if data.is_none() {
                    tracing::debug!(mint = %mint, "No priced DexScreener pair");
                }
                data
            }
            Err(e) => {
                tracing::warn!(mint = %mint, error = %e, "DexScreener fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_deepest_pair() {
        let body = r#"{"pairs":[
            {"pairAddress":"shallow","priceUsd":"0.0010","priceChange":{"m5":12.0},"volume":{"h24":10.0},"liquidity":{"usd":500.0}},
            {"pairAddress":"deep","priceUsd":"0.0012","priceChange":{"m5":-6.5},"volume":{"h24":250000.0},"liquidity":{"usd":90000.0}},
            {"pairAddress":"unpriced","liquidity":{"usd":1000000.0}}
        ]}"#;
        let resp: TokenPairsResponse = serde_json::from_str(body).unwrap();
        let data = to_market_data(&resp.pairs.unwrap()).unwrap();

        assert_eq!(data.price, Decimal::new(12, 4));
        assert_eq!(data.price_change_5m, Decimal::new(-65, 1));
        assert_eq!(data.volume_24h, Decimal::from(250_000));
    }

    #[test]
    fn test_no_pairs_is_none() {
        let resp: TokenPairsResponse = serde_json::from_str(r#"{"pairs":null}"#).unwrap();
        assert!(to_market_data(&resp.pairs.unwrap_or_default()).is_none());
    }
}
