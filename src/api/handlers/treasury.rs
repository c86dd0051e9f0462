use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{
    ActivityLog, ActivityType, AiDecision, GlobalStats, TreasuryAction, TreasuryReserves,
};
use crate::AppState;

use super::{clamp_limit, ApiResponse};

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
}

/// GET /api/activity — newest-first treasury ledger
pub async fn activity(
    State(state): State<AppState>,
    Query(q): Query<ActivityQuery>,
) -> Result<Json<ApiResponse<Vec<ActivityLog>>>, AppError> {
    let activity_type = match q.activity_type.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            ActivityType::from_api_str(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown activity type: {raw}")))?,
        ),
    };
    let limit = clamp_limit(q.limit, 50, 500);

    let logs = state
        .store
        .treasury
        .recent_activity(limit, activity_type)
        .await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// Returned until the decision engine has completed its first cycle.
fn initializing_decision() -> AiDecision {
    AiDecision {
        action: TreasuryAction::Wait,
        reason: "Initializing market analysis".into(),
        confidence: Decimal::ZERO,
        timestamp: Utc::now(),
    }
}

/// GET /api/decision — latest market decision
pub async fn decision(State(state): State<AppState>) -> Json<ApiResponse<AiDecision>> {
    let latest = state.decision_rx.borrow().clone();
    Json(ApiResponse::ok(latest.unwrap_or_else(initializing_decision)))
}

/// GET /api/stats — running treasury totals
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GlobalStats>>, AppError> {
    let stats = state.store.treasury.global_stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/treasury/reserves — wallet balance split into pots and operational funds
pub async fn reserves(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TreasuryReserves>>, AppError> {
    let pots = state.store.treasury.pot_balances().await?;

    let total_balance = match (&state.balances, &state.config.treasury_wallet) {
        (Some(balances), Some(wallet)) => match balances.sol_balance(wallet).await {
            Ok(b) => Some(b),
            Err(e) => {
                tracing::warn!(error = %e, "Treasury balance unavailable");
                None
            }
        },
        _ => None,
    };

    let operational = total_balance.map(|total| (total - pots.total()).max(Decimal::ZERO));

    Ok(Json(ApiResponse::ok(TreasuryReserves {
        total_balance,
        burn_pot: pots.burn_pot,
        lp_pot: pots.lp_pot,
        operational,
    })))
}
