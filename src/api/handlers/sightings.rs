use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::intelligence::{score_at, SignalScore};
use crate::models::{TopToken, WhaleSighting};
use crate::AppState;

use super::{clamp_limit, ApiResponse};

#[derive(Deserialize)]
pub struct SightingsQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub verified: bool,
}

/// A sighting with its signal score computed at read time.
#[derive(Serialize)]
pub struct ScoredSighting {
    #[serde(flatten)]
    pub sighting: WhaleSighting,
    pub signal: SignalScore,
}

/// GET /api/sightings — newest-first whale sightings with signal scores
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<SightingsQuery>,
) -> Result<Json<ApiResponse<Vec<ScoredSighting>>>, AppError> {
    let limit = clamp_limit(q.limit, 50, 200);
    let min_reputation = q.verified.then_some(state.config.verified_min_reputation);

    let sightings = state
        .store
        .sightings
        .recent_sightings(limit, min_reputation)
        .await?;

    let wallets: Vec<String> = sightings.iter().map(|s| s.wallet.clone()).collect();
    let reputations = state.store.wallets.reputations(&wallets).await?;

    let mut scored = Vec::with_capacity(sightings.len());
    for sighting in sightings {
        let signal = score_at(
            state.store.sightings.as_ref(),
            reputations.get(&sighting.wallet).copied(),
            &sighting.mint,
            sighting.sol_amount,
            sighting.timestamp,
        )
        .await?;
        scored.push(ScoredSighting { sighting, signal });
    }

    Ok(Json(ApiResponse::ok(scored)))
}

#[derive(Deserialize)]
pub struct TopTokensQuery {
    pub limit: Option<i64>,
    pub hours: Option<i64>,
    #[serde(default)]
    pub verified: bool,
}

/// GET /api/tokens/top — mints ranked by distinct whales in the window
pub async fn top_tokens(
    State(state): State<AppState>,
    Query(q): Query<TopTokensQuery>,
) -> Result<Json<ApiResponse<Vec<TopToken>>>, AppError> {
    let limit = clamp_limit(q.limit, 10, 100);
    let hours = q.hours.unwrap_or(24).clamp(1, 24 * 7);
    let min_reputation = q.verified.then_some(state.config.verified_min_reputation);
    let since = Utc::now() - Duration::hours(hours);

    let tokens = state
        .store
        .sightings
        .top_tokens(since, limit, min_reputation)
        .await?;
    Ok(Json(ApiResponse::ok(tokens)))
}
