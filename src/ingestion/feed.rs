use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FeedEvent, TokenCreated, TradeEvent};

/// Default PumpPortal data socket.
pub const PUMPPORTAL_WS_URL: &str = "wss://pumpportal.fun/api/data";

/// Why a raw stream message was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum FeedError {
    #[error("invalid json: {0}")]
    BadJson(String),

    #[error("unknown tx type: {0}")]
    UnknownTxType(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("non-positive sol amount: {0}")]
    NonPositiveAmount(Decimal),

    #[error("{0} is not a base58 address")]
    InvalidAddress(&'static str),
}

/// Subscription frame sent to PumpPortal.
#[derive(Debug, Clone, Serialize)]
pub struct Subscribe {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

impl Subscribe {
    pub fn new_tokens() -> Self {
        Self {
            method: "subscribeNewToken",
            keys: None,
        }
    }

    pub fn token_trades(mints: Vec<String>) -> Self {
        Self {
            method: "subscribeTokenTrade",
            keys: Some(mints),
        }
    }

    pub fn stop_token_trades(mints: Vec<String>) -> Self {
        Self {
            method: "unsubscribeTokenTrade",
            keys: Some(mints),
        }
    }
}

/// Raw PumpPortal payload. Create and trade messages share one shape; fields
/// not present on a given message type are `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub tx_type: Option<String>,
    pub mint: Option<String>,
    pub trader_public_key: Option<String>,
    pub sol_amount: Option<f64>,
    pub market_cap_sol: Option<f64>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub uri: Option<String>,
    /// Milliseconds since epoch, when the relay provides it.
    pub timestamp: Option<i64>,
    /// Present on subscription acks.
    pub message: Option<String>,
}

/// Parse one text frame. `Ok(None)` means a control message (ack, notice).
pub fn parse_message(text: &str, received_at: DateTime<Utc>) -> Result<Option<FeedEvent>, FeedError> {
    let raw: RawMessage =
        serde_json::from_str(text).map_err(|e| FeedError::BadJson(e.to_string()))?;

    if raw.tx_type.is_none() && raw.message.is_some() {
        return Ok(None);
    }

    to_feed_event(raw, received_at).map(Some)
}

/// Validate a raw message into a typed event.
pub fn to_feed_event(raw: RawMessage, received_at: DateTime<Utc>) -> Result<FeedEvent, FeedError> {
    let tx_type = raw.tx_type.ok_or(FeedError::MissingField("txType"))?;
    let mint = address(raw.mint, "mint")?;
    let wallet = address(raw.trader_public_key, "traderPublicKey")?;

    match tx_type.as_str() {
        "create" => Ok(FeedEvent::Create(TokenCreated {
            mint,
            name: raw.name.unwrap_or_default(),
            symbol: non_empty(raw.symbol).unwrap_or_else(|| "UNKNOWN".to_string()),
            creator_wallet: wallet,
            image_uri: non_empty(raw.uri),
        })),
        "buy" | "sell" => {
            let sol_amount = raw
                .sol_amount
                .and_then(Decimal::from_f64)
                .ok_or(FeedError::MissingField("solAmount"))?;
            if sol_amount <= Decimal::ZERO {
                return Err(FeedError::NonPositiveAmount(sol_amount));
            }

            let timestamp = raw
                .timestamp
                .and_then(DateTime::from_timestamp_millis)
                .unwrap_or(received_at);

            let trade = TradeEvent {
                mint,
                wallet,
                sol_amount,
                market_cap_sol: raw.market_cap_sol.and_then(Decimal::from_f64),
                timestamp,
            };

            if tx_type == "buy" {
                Ok(FeedEvent::Buy(trade))
            } else {
                Ok(FeedEvent::Sell(trade))
            }
        }
        other => Err(FeedError::UnknownTxType(other.to_string())),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn is_base58(s: &str) -> bool {
    s.chars().all(|c| BASE58_ALPHABET.contains(c))
}

fn address(value: Option<String>, field: &'static str) -> Result<String, FeedError> {
    let value = non_empty(value).ok_or(FeedError::MissingField(field))?;
    if !is_base58(&value) {
        return Err(FeedError::InvalidAddress(field));
    }
    Ok(value)
}
