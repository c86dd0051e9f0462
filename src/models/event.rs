use rust_decimal::Decimal;
use serde::Serialize;

use super::{Position, TrackedWallet, WhaleSighting};

/// Side effects produced by the ingestion pipeline, handed to the dispatcher.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TrackerEvent {
    WhaleSighted(WhaleSighting),
    PositionOpened(Position),
    PositionClosed {
        position: Position,
        wallet: TrackedWallet,
        hold_minutes: Decimal,
        is_churn: bool,
    },
    DevSell {
        mint: String,
        creator: String,
        sol_amount: Decimal,
    },
}
