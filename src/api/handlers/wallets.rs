use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Position, TrackedWallet};
use crate::AppState;

use super::{clamp_limit, ApiResponse};

const HISTORY_LIMIT: i64 = 50;
const EXPORT_LIMIT: i64 = 5_000;

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
}

/// GET /api/leaderboard — wallets by reputation, then profit
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<ApiResponse<Vec<TrackedWallet>>>, AppError> {
    let limit = clamp_limit(q.limit, 20, 100);
    let wallets = state.store.wallets.leaderboard(limit).await?;
    Ok(Json(ApiResponse::ok(wallets)))
}

#[derive(Serialize)]
pub struct WalletDetail {
    pub wallet: TrackedWallet,
    pub positions: Vec<Position>,
}

/// Stored record, or a neutral one for a wallet whose positions are all still open.
async fn load_wallet(
    state: &AppState,
    address: &str,
    limit: i64,
) -> Result<WalletDetail, AppError> {
    let wallet = state.store.wallets.get_wallet(address).await?;
    let positions = state
        .store
        .positions
        .get_positions_by_wallet(address, limit)
        .await?;

    let wallet = match wallet {
        Some(w) => w,
        None => {
            let last = positions
                .iter()
                .map(|p| p.buy_timestamp)
                .max()
                .ok_or_else(|| AppError::NotFound("wallet not found".into()))?;
            TrackedWallet::new(address, last)
        }
    };

    Ok(WalletDetail { wallet, positions })
}

/// GET /api/wallets/:address — wallet stats and recent trades
pub async fn detail(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WalletDetail>>, AppError> {
    let detail = load_wallet(&state, &address, HISTORY_LIMIT).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// GET /api/wallets/:address/export — trade history as CSV or JSON
pub async fn export(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(q): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = q.format.as_deref().unwrap_or("json").to_ascii_lowercase();
    if format != "csv" && format != "json" {
        return Err(AppError::BadRequest(format!("unsupported format: {format}")));
    }

    let detail = load_wallet(&state, &address, EXPORT_LIMIT).await?;

    if format == "json" {
        return Ok(Json(ApiResponse::ok(detail.positions)).into_response());
    }

    let body = positions_csv(&detail.positions)?;
    let disposition = format!("attachment; filename=\"{address}_trades.csv\"");
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// One row per position, newest first as stored.
pub fn positions_csv(positions: &[Position]) -> Result<String, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record([
        "Date",
        "Token",
        "Buy Amount",
        "Sell Amount",
        "PnL",
        "Hold Time",
        "Status",
    ])?;

    let now = Utc::now();
    for p in positions {
        let hold = format!("{}m", p.hold_minutes(now).round_dp(1));
        wtr.write_record([
            p.buy_timestamp.to_rfc3339(),
            p.mint.clone(),
            p.buy_amount_sol.to_string(),
            p.sell_amount_sol.map(|d| d.to_string()).unwrap_or_default(),
            p.pnl_sol.map(|d| d.to_string()).unwrap_or_default(),
            hold,
            p.status.clone(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {}", e.error()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.into()))
}
