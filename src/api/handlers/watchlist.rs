use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{TrackedWallet, WatchlistEntry};
use crate::AppState;

use super::ApiResponse;

#[derive(Deserialize)]
pub struct AddWatchRequest {
    pub address: String,
    pub label: Option<String>,
}

#[derive(Serialize)]
pub struct WatchedWallet {
    #[serde(flatten)]
    pub entry: WatchlistEntry,
    /// Present once the wallet has closed a position.
    pub wallet: Option<TrackedWallet>,
}

/// GET /api/watchlist
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WatchlistEntry>>>, AppError> {
    let entries = state.store.watchlist.list().await?;
    Ok(Json(ApiResponse::ok(entries)))
}

/// POST /api/watchlist — add or relabel
pub async fn add(
    State(state): State<AppState>,
    Json(req): Json<AddWatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WatchlistEntry>>), AppError> {
    let address = req.address.trim();
    if address.is_empty() {
        return Err(AppError::BadRequest("address is required".into()));
    }
    let label = req.label.as_deref().map(str::trim).filter(|l| !l.is_empty());

    let entry = state.store.watchlist.add(address, label).await?;
    tracing::info!(wallet = %entry.address, "Watchlist entry saved");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(entry))))
}

/// GET /api/watchlist/:address
pub async fn get(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<WatchedWallet>>, AppError> {
    let entry = state
        .store
        .watchlist
        .get(&address)
        .await?
        .ok_or_else(|| AppError::NotFound("address not on watchlist".into()))?;
    let wallet = state.store.wallets.get_wallet(&address).await?;

    Ok(Json(ApiResponse::ok(WatchedWallet { entry, wallet })))
}

/// DELETE /api/watchlist/:address
pub async fn remove(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    if !state.store.watchlist.remove(&address).await? {
        return Err(AppError::NotFound("address not on watchlist".into()));
    }
    Ok(Json(ApiResponse::ok(())))
}
