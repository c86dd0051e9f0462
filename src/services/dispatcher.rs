use std::sync::Arc;

use tokio::sync::broadcast;

use crate::api::ws_types::{DevSellData, PositionClosedData, WsMessage};
use crate::execution::CycleReport;
use crate::models::{AiDecision, TrackerEvent};

use super::notifier::{self, Notifier};

/// Performs the side effects of pipeline and treasury results: dashboard
/// broadcast and Telegram. Neither can fail the caller.
#[derive(Clone)]
pub struct Dispatcher {
    ws_tx: broadcast::Sender<WsMessage>,
    notifier: Option<Arc<Notifier>>,
}

impl Dispatcher {
    pub fn new(ws_tx: broadcast::Sender<WsMessage>, notifier: Option<Arc<Notifier>>) -> Self {
        Self { ws_tx, notifier }
    }

    fn broadcast(&self, msg: WsMessage) {
        // Err only means no dashboard is connected.
        if self.ws_tx.send(msg).is_err() {
            tracing::trace!("No WebSocket subscribers");
        }
    }

    fn notify(&self, text: String) {
        if let Some(n) = &self.notifier {
            let n = Arc::clone(n);
            tokio::spawn(async move { n.send(&text).await });
        }
    }

    pub async fn dispatch_tracker_event(&self, event: &TrackerEvent) {
        match event {
            TrackerEvent::WhaleSighted(s) => {
                self.notify(notifier::format_whale_alert(s));
                self.broadcast(WsMessage::WhaleAlert(s.clone()));
            }
            TrackerEvent::PositionOpened(p) => {
                self.broadcast(WsMessage::PositionOpened(p.clone()));
            }
            TrackerEvent::PositionClosed {
                position,
                wallet,
                hold_minutes,
                is_churn,
            } => {
                self.notify(notifier::format_position_closed(
                    position,
                    wallet,
                    *hold_minutes,
                    *is_churn,
                ));
                self.broadcast(WsMessage::PositionClosed(PositionClosedData {
                    position: position.clone(),
                    hold_minutes: hold_minutes.round_dp(2).to_string(),
                    is_churn: *is_churn,
                    reputation: wallet.reputation_score,
                    win_rate: wallet.win_rate.round_dp(2).to_string(),
                }));
            }
            TrackerEvent::DevSell {
                mint,
                creator,
                sol_amount,
            } => {
                self.notify(notifier::format_dev_sell(mint, creator, *sol_amount));
                self.broadcast(WsMessage::DevSell(DevSellData {
                    mint: mint.clone(),
                    creator: creator.clone(),
                    sol_amount: *sol_amount,
                }));
            }
        }
    }

    pub async fn dispatch_decision(&self, decision: &AiDecision) {
        self.broadcast(WsMessage::Decision(decision.clone()));
    }

    pub async fn dispatch_cycle(&self, report: &CycleReport) {
        self.notify(notifier::format_treasury_cycle(report));
        self.broadcast(WsMessage::TreasuryCycle(report.clone()));
    }
}
