use chrono::Utc;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::models::FeedEvent;

use super::feed::{parse_message, Subscribe};

const PING_INTERVAL: Duration = Duration::from_secs(25);
const BASE_RECONNECT_DELAY: Duration = Duration::from_secs(2);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Which mints the listener asks trades for.
#[derive(Debug, Clone)]
pub enum TradeScope {
    /// A fixed list.
    Mints(Vec<String>),
    /// Every newly created mint, keeping at most this many subscriptions.
    NewTokens(usize),
}

impl TradeScope {
    pub fn from_config(tracked_mints: &[String], capacity: usize) -> Self {
        if tracked_mints.is_empty() {
            TradeScope::NewTokens(capacity)
        } else {
            TradeScope::Mints(tracked_mints.to_vec())
        }
    }
}

/// Delay before reconnect attempt `attempt` (0-based): 2s doubling, capped at 60s.
pub fn backoff_delay(attempt: u32) -> Duration {
    BASE_RECONNECT_DELAY
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(MAX_RECONNECT_DELAY)
}

async fn send_subscribe(write: &mut WsWrite, sub: &Subscribe) -> bool {
    let Ok(text) = serde_json::to_string(sub) else {
        return false;
    };
    match write.send(Message::Text(text.into())).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, method = sub.method, "Failed to send subscribe message");
            false
        }
    }
}

/// Run the PumpPortal listener forever, forwarding validated events to `tx`.
///
/// In `NewTokens` mode the followed set survives reconnects and is bounded by
/// an LRU; evicted mints are unsubscribed.
pub async fn run_ws_listener(ws_url: String, scope: TradeScope, tx: mpsc::Sender<FeedEvent>) {
    let mut attempt: u32 = 0;
    let mut followed: Option<LruCache<String, ()>> = match &scope {
        TradeScope::NewTokens(cap) => Some(LruCache::new(
            NonZeroUsize::new(*cap).unwrap_or(NonZeroUsize::MIN),
        )),
        TradeScope::Mints(_) => None,
    };

    loop {
        tracing::info!(url = %ws_url, "Connecting to PumpPortal WebSocket...");

        match connect_async(&ws_url).await {
            Ok((ws_stream, _response)) => {
                tracing::info!("WebSocket connected successfully");
                attempt = 0;

                let (mut write, mut read) = ws_stream.split();

                let initial: Vec<String> = match (&scope, &followed) {
                    (TradeScope::Mints(mints), _) => mints.clone(),
                    (_, Some(cache)) => cache.iter().map(|(m, _)| m.clone()).collect(),
                    _ => Vec::new(),
                };
                let mut ok = send_subscribe(&mut write, &Subscribe::new_tokens()).await;
                if ok && !initial.is_empty() {
                    ok = send_subscribe(&mut write, &Subscribe::token_trades(initial.clone())).await;
                }
                if !ok {
                    sleep(backoff_delay(attempt)).await;
                    attempt = attempt.saturating_add(1);
                    continue;
                }
                tracing::info!(mint_count = initial.len(), "Subscribed to token feed");

                let mut ping_timer = interval(PING_INTERVAL);
                ping_timer.tick().await; // consume the first immediate tick

                loop {
                    tokio::select! {
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    let Some(event) = decode(text.as_ref()) else { continue };

                                    if let (FeedEvent::Create(created), Some(cache)) = (&event, followed.as_mut()) {
                                        if !follow_mint(&mut write, cache, &created.mint).await {
                                            break;
                                        }
                                    }

                                    if let Err(e) = tx.send(event).await {
                                        tracing::error!(error = %e, "Pipeline channel closed, stopping listener");
                                        return;
                                    }
                                }
                                Some(Ok(Message::Ping(data))) => {
                                    if let Err(e) = write.send(Message::Pong(data)).await {
                                        tracing::warn!(error = %e, "Failed to send pong");
                                        break;
                                    }
                                }
                                Some(Ok(Message::Close(_))) => {
                                    tracing::warn!("WebSocket server sent close frame");
                                    break;
                                }
                                Some(Ok(_)) => {} // Binary, Pong, Frame — ignore
                                Some(Err(e)) => {
                                    tracing::error!(error = %e, "WebSocket read error");
                                    break;
                                }
                                None => {
                                    tracing::warn!("WebSocket stream ended");
                                    break;
                                }
                            }
                        }
                        _ = ping_timer.tick() => {
                            if let Err(e) = write.send(Message::Ping(vec![].into())).await {
                                tracing::warn!(error = %e, "Failed to send ping");
                                break;
                            }
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket connection failed");
            }
        }

        let delay = backoff_delay(attempt);
        attempt = attempt.saturating_add(1);
        tracing::info!(delay_secs = delay.as_secs(), attempt, "Reconnecting...");
        sleep(delay).await;
    }
}

/// Subscribe to trades on a freshly created mint, dropping the least recently
/// created one when the set is full. Returns false if the socket is broken.
async fn follow_mint(write: &mut WsWrite, cache: &mut LruCache<String, ()>, mint: &str) -> bool {
    if let Some((evicted, ())) = cache.push(mint.to_string(), ()) {
        if evicted != mint
            && !send_subscribe(write, &Subscribe::stop_token_trades(vec![evicted])).await
        {
            return false;
        }
    }
    send_subscribe(write, &Subscribe::token_trades(vec![mint.to_string()])).await
}

/// Parse a text frame, dropping control and invalid messages.
fn decode(text: &str) -> Option<FeedEvent> {
    match parse_message(text, Utc::now()) {
        Ok(Some(event)) => {
            tracing::trace!(event = %event, "Feed event");
            Some(event)
        }
        Ok(None) => {
            tracing::debug!(raw = %text, "Control message received");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "Dropping invalid feed message");
            None
        }
    }
}
