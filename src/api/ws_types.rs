use rust_decimal::Decimal;
use serde::Serialize;

use crate::execution::CycleReport;
use crate::models::{AiDecision, Position, WhaleSighting};

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "whale_alert")]
    WhaleAlert(WhaleSighting),

    #[serde(rename = "position_opened")]
    PositionOpened(Position),

    #[serde(rename = "position_closed")]
    PositionClosed(PositionClosedData),

    #[serde(rename = "dev_sell")]
    DevSell(DevSellData),

    #[serde(rename = "decision")]
    Decision(AiDecision),

    #[serde(rename = "treasury_cycle")]
    TreasuryCycle(CycleReport),
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionClosedData {
    pub position: Position,
    pub hold_minutes: String,
    pub is_churn: bool,
    pub reputation: i32,
    pub win_rate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DevSellData {
    pub mint: String,
    pub creator: String,
    pub sol_amount: Decimal,
}
