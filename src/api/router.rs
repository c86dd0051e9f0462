use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    let protected = Router::new()
        // Treasury
        .route("/api/activity", get(handlers::treasury::activity))
        .route("/api/decision", get(handlers::treasury::decision))
        .route("/api/stats", get(handlers::treasury::stats))
        .route("/api/treasury/reserves", get(handlers::treasury::reserves))
        // Whale tracking
        .route("/api/sightings", get(handlers::sightings::list))
        .route("/api/tokens/top", get(handlers::sightings::top_tokens))
        .route("/api/leaderboard", get(handlers::wallets::leaderboard))
        .route("/api/positions/open", get(handlers::positions::open))
        .route("/api/wallets/:address", get(handlers::wallets::detail))
        .route("/api/wallets/:address/export", get(handlers::wallets::export))
        // Watchlist
        .route(
            "/api/watchlist",
            get(handlers::watchlist::list).post(handlers::watchlist::add),
        )
        .route(
            "/api/watchlist/:address",
            get(handlers::watchlist::get).delete(handlers::watchlist::remove),
        )
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
