use rust_decimal::Decimal;
use serde_json::json;

use crate::execution::{CycleReport, SpendOutcome};
use crate::models::{Position, TrackedWallet, WhaleSighting};

/// Telegram notification service. Failures are logged but never block the main flow.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Build from optional config values; `None` unless both are set.
    pub fn from_config(bot_token: Option<&String>, chat_id: Option<&String>) -> Option<Self> {
        match (bot_token, chat_id) {
            (Some(t), Some(c)) => Some(Self::new(t.clone(), c.clone())),
            _ => None,
        }
    }

    /// Send a Telegram message. Failures are logged as warnings.
    pub async fn send(&self, message: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

fn short_addr(addr: &str) -> String {
    let chars: Vec<char> = addr.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        addr.to_string()
    }
}

/// Whale sighting alert.
pub fn format_whale_alert(s: &WhaleSighting) -> String {
    let side = if s.is_buy { "BUY" } else { "SELL" };
    let pod = s
        .pod_reputation
        .map(|p| format!("\nPod reputation: {p}"))
        .unwrap_or_default();
    format!(
        "*Whale {}*\nToken: ${}\nAmount: {} SOL\nWallet: `{}`{}\nMint: `{}`",
        side,
        s.symbol,
        s.sol_amount.round_dp(2),
        short_addr(&s.wallet),
        pod,
        s.mint,
    )
}

/// Closed position summary with the wallet's updated standing.
pub fn format_position_closed(
    position: &Position,
    wallet: &TrackedWallet,
    hold_minutes: Decimal,
    is_churn: bool,
) -> String {
    let pnl = position.pnl_sol.unwrap_or(Decimal::ZERO);
    let verdict = if pnl > Decimal::ZERO { "WIN" } else { "LOSS" };
    let churn = if is_churn { " (churn)" } else { "" };
    format!(
        "*Position Closed: {}*{}\nWallet: `{}`\nPnL: {} SOL\nHeld: {} min\nReputation: {}/100\nWin rate: {}%",
        verdict,
        churn,
        short_addr(&position.wallet),
        pnl.round_dp(3),
        hold_minutes.round_dp(1),
        wallet.reputation_score,
        wallet.win_rate.round_dp(1),
    )
}

/// Creator dump warning.
pub fn format_dev_sell(mint: &str, creator: &str, sol_amount: Decimal) -> String {
    format!(
        "*DEV SELL*\nCreator `{}` sold {} SOL\nMint: `{}`",
        short_addr(creator),
        sol_amount.round_dp(2),
        mint,
    )
}

/// Treasury cycle summary.
pub fn format_treasury_cycle(r: &CycleReport) -> String {
    let revshare = match (&r.revshare, &r.revshare_error) {
        (Some(rs), _) if rs.skipped.is_none() => format!(
            "{} SOL to {} holders",
            rs.sent_sol.round_dp(4),
            rs.recipients
        ),
        (Some(_), _) => "skipped".to_string(),
        (None, Some(e)) => format!("failed ({e})"),
        (None, None) => "n/a".to_string(),
    };
    let spend = match &r.spend {
        SpendOutcome::Held => "held".to_string(),
        SpendOutcome::Executed { amount, .. } => format!("{} SOL", amount.round_dp(4)),
        SpendOutcome::Failed { amount, .. } => format!("FAILED ({} SOL kept)", amount.round_dp(4)),
    };
    let title = if r.dry_run {
        "*Treasury Cycle (dry run)*"
    } else {
        "*Treasury Cycle*"
    };
    format!(
        "{title}\nFees: {} SOL\nRevShare: {}\nDecision: {} ({}%)\nSpend: {}\nBurn pot: {} SOL\nLP pot: {} SOL",
        r.total_fee.round_dp(4),
        revshare,
        r.decision.action,
        (r.decision.confidence * Decimal::ONE_HUNDRED).round_dp(0),
        spend,
        r.pots.burn_pot.round_dp(4),
        r.pots.lp_pot.round_dp(4),
    )
}
