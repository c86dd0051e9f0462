use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::intelligence::{score_at, SignalScore};
use crate::models::Position;
use crate::AppState;

use super::{clamp_limit, ApiResponse};

#[derive(Deserialize)]
pub struct OpenPositionsQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct OpenPositionView {
    #[serde(flatten)]
    pub position: Position,
    pub hold_minutes: Decimal,
    pub signal: SignalScore,
}

/// GET /api/positions/open — open positions with hold time so far
pub async fn open(
    State(state): State<AppState>,
    Query(q): Query<OpenPositionsQuery>,
) -> Result<Json<ApiResponse<Vec<OpenPositionView>>>, AppError> {
    let limit = clamp_limit(q.limit, 50, 200);
    let positions = state.store.positions.get_open_positions(limit).await?;

    let wallets: Vec<String> = positions.iter().map(|p| p.wallet.clone()).collect();
    let reputations = state.store.wallets.reputations(&wallets).await?;

    let now = Utc::now();
    let mut views = Vec::with_capacity(positions.len());
    for position in positions {
        let signal = score_at(
            state.store.sightings.as_ref(),
            reputations.get(&position.wallet).copied(),
            &position.mint,
            position.buy_amount_sol,
            position.buy_timestamp,
        )
        .await?;
        views.push(OpenPositionView {
            hold_minutes: position.hold_minutes(now).round_dp(2),
            position,
            signal,
        });
    }

    Ok(Json(ApiResponse::ok(views)))
}
