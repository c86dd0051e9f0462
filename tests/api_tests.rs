mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use pumpwhale::api::create_router;
use pumpwhale::db::Store;
use pumpwhale::models::treasury::pot;
use pumpwhale::models::{
    ActivityType, AiDecision, NewSighting, TrackedWallet, TreasuryAction,
};

use common::FixedBalance;

const VERIFIED: &str = "VerifiedWhale111111111111111111111111111111";
const STRANGER: &str = "StrangerWhale111111111111111111111111111111";

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn app(store: Store) -> axum::Router {
    let (state, _decisions) = common::test_state(store, common::test_config(), None);
    create_router(state)
}

fn sighting(wallet: &str, mint: &str, sol: i64, minutes_ago: i64) -> NewSighting {
    NewSighting {
        mint: mint.into(),
        symbol: mint.to_uppercase(),
        image_uri: None,
        sol_amount: Decimal::from(sol),
        wallet: wallet.into(),
        is_buy: true,
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
        market_cap: None,
        pod_reputation: None,
    }
}

async fn seed_verified_wallet(store: &Store) {
    let wallet = TrackedWallet {
        wins: 4,
        total_trades: 4,
        win_rate: Decimal::ONE_HUNDRED,
        reputation_score: 80,
        ..TrackedWallet::new(VERIFIED, Utc::now())
    };
    store.wallets.save_wallet(&wallet).await.unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let resp = app(Store::in_memory()).oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["treasury"], true);
}

#[tokio::test]
async fn test_metrics_endpoint_renders() {
    let resp = app(Store::in_memory()).oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bearer_auth_guards_api_routes() {
    let mut config = common::test_config();
    config.api_token = Some("secret".into());
    let (state, _decisions) = common::test_state(Store::in_memory(), config, None);
    let app = create_router(state);

    let resp = app.clone().oneshot(get("/api/stats")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/api/stats")
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.clone().oneshot(wrong).await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );

    let ok = Request::builder()
        .uri("/api/stats")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(ok).await.unwrap().status(), StatusCode::OK);

    // Health stays public
    assert_eq!(
        app.oneshot(get("/health")).await.unwrap().status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_activity_filter_and_bad_type() {
    let store = Store::in_memory();
    store
        .treasury
        .log_activity(ActivityType::FeeClaim, Decimal::ONE, None, None)
        .await
        .unwrap();
    store
        .treasury
        .log_activity(ActivityType::Burn, Decimal::new(3, 1), Some("tx-1"), None)
        .await
        .unwrap();
    let app = app(store);

    let resp = app.clone().oneshot(get("/api/activity")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["activity_type"], "BURN");

    // HARVEST is the legacy name of FEE_CLAIM
    let resp = app
        .clone()
        .oneshot(get("/api/activity?type=harvest"))
        .await
        .unwrap();
    let json = body_json(resp).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["activity_type"], "FEE_CLAIM");

    let resp = app.oneshot(get("/api/activity?type=MINT")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_decision_placeholder_then_latest() {
    let (state, decisions) =
        common::test_state(Store::in_memory(), common::test_config(), None);
    let app = create_router(state);

    let json = body_json(app.clone().oneshot(get("/api/decision")).await.unwrap()).await;
    assert_eq!(json["data"]["action"], "WAIT");
    assert_eq!(json["data"]["reason"], "Initializing market analysis");

    decisions.send_replace(Some(AiDecision {
        action: TreasuryAction::AddLp,
        reason: "Floor defense".into(),
        confidence: Decimal::new(90, 2),
        timestamp: Utc::now(),
    }));

    let json = body_json(app.oneshot(get("/api/decision")).await.unwrap()).await;
    assert_eq!(json["data"]["action"], "ADD_LP");
    assert_eq!(json["data"]["reason"], "Floor defense");
}

#[tokio::test]
async fn test_reserves_split_balance_into_pots() {
    let store = Store::in_memory();
    store.treasury.accrue_pot(pot::BURN, Decimal::new(3, 1)).await.unwrap();
    store.treasury.accrue_pot(pot::LP, Decimal::new(2, 1)).await.unwrap();
    let (state, _decisions) = common::test_state(
        store,
        common::test_config(),
        Some(Arc::new(FixedBalance(Decimal::from(2)))),
    );

    let resp = create_router(state)
        .oneshot(get("/api/treasury/reserves"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["burn_pot"], "0.3");
    assert_eq!(json["data"]["lp_pot"], "0.2");
    assert_eq!(json["data"]["operational"], "1.5");
}

#[tokio::test]
async fn test_reserves_without_balance_source() {
    let json = body_json(
        app(Store::in_memory())
            .oneshot(get("/api/treasury/reserves"))
            .await
            .unwrap(),
    )
    .await;
    assert!(json["data"]["total_balance"].is_null());
    assert!(json["data"]["operational"].is_null());
}

#[tokio::test]
async fn test_sightings_carry_signal_and_verified_filter() {
    let store = Store::in_memory();
    seed_verified_wallet(&store).await;
    store
        .sightings
        .insert_sighting(&sighting(STRANGER, "mintb", 2, 2))
        .await
        .unwrap();
    store
        .sightings
        .insert_sighting(&sighting(VERIFIED, "minta", 10, 1))
        .await
        .unwrap();
    let app = app(store);

    let json = body_json(app.clone().oneshot(get("/api/sightings")).await.unwrap()).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);

    // Newest first; 80 rep -> 32, 10 SOL -> 35, one whale -> 5
    assert_eq!(rows[0]["wallet"], VERIFIED);
    assert_eq!(rows[0]["signal"]["score"], 72);
    assert_eq!(rows[0]["signal"]["grade"], "A");
    // Unknown wallet scored at the neutral 50 -> 20 + 20 + 5
    assert_eq!(rows[1]["wallet"], STRANGER);
    assert_eq!(rows[1]["signal"]["score"], 45);
    assert_eq!(rows[1]["signal"]["grade"], "C");

    let json = body_json(
        app.oneshot(get("/api/sightings?verified=true"))
            .await
            .unwrap(),
    )
    .await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["wallet"], VERIFIED);
}

#[tokio::test]
async fn test_top_tokens_counts_distinct_whales() {
    let store = Store::in_memory();
    seed_verified_wallet(&store).await;
    for (wallet, minutes_ago) in [(VERIFIED, 5), (VERIFIED, 4), (STRANGER, 3)] {
        store
            .sightings
            .insert_sighting(&sighting(wallet, "minta", 3, minutes_ago))
            .await
            .unwrap();
    }
    store
        .sightings
        .insert_sighting(&sighting(STRANGER, "mintb", 50, 1))
        .await
        .unwrap();
    // Outside the one-hour window
    store
        .sightings
        .insert_sighting(&sighting(VERIFIED, "mintc", 9, 120))
        .await
        .unwrap();

    let json = body_json(
        app(store)
            .oneshot(get("/api/tokens/top?hours=1"))
            .await
            .unwrap(),
    )
    .await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["mint"], "minta");
    assert_eq!(rows[0]["whale_count"], 2);
    assert_eq!(rows[0]["total_volume_sol"], "9");
    assert_eq!(rows[1]["mint"], "mintb");
}

#[tokio::test]
async fn test_open_positions_have_hold_time_and_signal() {
    let store = Store::in_memory();
    let bought = Utc::now() - Duration::minutes(3);
    store
        .positions
        .open_position(VERIFIED, "minta", Decimal::from(2), bought, bought + Duration::minutes(10))
        .await
        .unwrap();

    let json = body_json(app(store).oneshot(get("/api/positions/open")).await.unwrap()).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["wallet"], VERIFIED);
    assert_eq!(rows[0]["status"], "OPEN");
    let hold: f64 = rows[0]["hold_minutes"].as_str().unwrap().parse().unwrap();
    assert!((2.9..4.0).contains(&hold));
    // Neutral reputation, 2 SOL, no sightings -> 20 + 20 + 5
    assert_eq!(rows[0]["signal"]["score"], 45);
}

#[tokio::test]
async fn test_wallet_detail_and_unknown_wallet() {
    let store = Store::in_memory();
    seed_verified_wallet(&store).await;
    let app = app(store);

    let resp = app
        .clone()
        .oneshot(get(&format!("/api/wallets/{VERIFIED}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["wallet"]["reputation_score"], 80);
    assert!(json["data"]["positions"].as_array().unwrap().is_empty());

    let resp = app.oneshot(get("/api/wallets/NobodyHere")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wallet_export_csv_and_bad_format() {
    let store = Store::in_memory();
    let bought = Utc::now() - Duration::minutes(20);
    store
        .positions
        .open_position(STRANGER, "minta", Decimal::from(2), bought, bought + Duration::minutes(10))
        .await
        .unwrap();
    store
        .positions
        .close_oldest_open(STRANGER, "minta", Decimal::from(3), bought + Duration::minutes(6))
        .await
        .unwrap();
    let app = app(store);

    let resp = app
        .clone()
        .oneshot(get(&format!("/api/wallets/{STRANGER}/export?format=csv")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Date,Token,Buy Amount,Sell Amount,PnL,Hold Time,Status"
    );
    assert!(lines.next().unwrap().ends_with("CLOSED"));

    let json = body_json(
        app.clone()
            .oneshot(get(&format!("/api/wallets/{STRANGER}/export")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let resp = app
        .oneshot(get(&format!("/api/wallets/{STRANGER}/export?format=xml")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_watchlist_crud() {
    let app = app(Store::in_memory());

    let add = Request::builder()
        .method("POST")
        .uri("/api/watchlist")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "address": VERIFIED, "label": "smart money" }).to_string(),
        ))
        .unwrap();
    let resp = app.clone().oneshot(add).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let json = body_json(app.clone().oneshot(get("/api/watchlist")).await.unwrap()).await;
    assert_eq!(json["data"][0]["label"], "smart money");

    let json = body_json(
        app.clone()
            .oneshot(get(&format!("/api/watchlist/{VERIFIED}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(json["data"]["address"], VERIFIED);
    assert!(json["data"]["wallet"].is_null());

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/watchlist/{VERIFIED}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.clone().oneshot(delete).await.unwrap().status(), StatusCode::OK);

    let delete_again = Request::builder()
        .method("DELETE")
        .uri(format!("/api/watchlist/{VERIFIED}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(
        app.oneshot(delete_again).await.unwrap().status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_watchlist_rejects_blank_address() {
    let add = Request::builder()
        .method("POST")
        .uri("/api/watchlist")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"address":"  "}"#))
        .unwrap();
    let resp = app(Store::in_memory()).oneshot(add).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
