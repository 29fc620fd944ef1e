//! HTTP-level tests: requests go through the router with `oneshot`, backed by
//! an in-memory store and a null ledger.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cleanchain_node::{Collaborators, EngineMetrics, LifecycleEngine};
use cleanchain_nullables::{NullClock, NullLedger, NullNotifier, NullStore};
use cleanchain_rpc::{router, RpcState};
use cleanchain_store::{Location, LocationStore};
use cleanchain_types::{Coordinates, EngineParams, LocationId, TokenAmount};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApi {
    app: Router,
    ledger: Arc<NullLedger>,
}

fn api(enable_metrics: bool) -> TestApi {
    let store = Arc::new(NullStore::new());
    let ledger = Arc::new(NullLedger::new());
    let deps = Collaborators {
        locations: store.clone(),
        users: store.clone(),
        ledger: ledger.clone(),
        notifier: Arc::new(NullNotifier::new()),
        clock: Arc::new(NullClock::new(1_700_000_000)),
    };
    let engine = LifecycleEngine::new(
        deps,
        EngineParams::default(),
        Arc::new(EngineMetrics::new().unwrap()),
    );
    store
        .insert_location(&Location::new(
            LocationId::parse("pier-7").unwrap(),
            "Pier 7",
            Coordinates::new(40.7128, -74.0060).unwrap(),
            Some(TokenAmount::new(25)),
        ))
        .unwrap();

    let state = Arc::new(RpcState {
        engine: Arc::new(engine),
        enable_metrics,
    });
    TestApi {
        app: router(state),
        ledger,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

async fn claim(app: &Router, wallet: &str, lat: f64, lng: f64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/claim-location",
        Some(json!({
            "walletAddress": wallet,
            "locationId": "pier-7",
            "userLat": lat,
            "userLng": lng,
        })),
    )
    .await
}

async fn vote(app: &Router, voter: &str, vote_type: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/vote",
        Some(json!({ "voterId": voter, "locationId": "pier-7", "voteType": vote_type })),
    )
    .await
}

#[tokio::test]
async fn lists_and_fetches_locations() {
    let t = api(false);
    let (status, body) = send(&t.app, Method::GET, "/api/locations", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "pier-7");
    assert_eq!(body[0]["claimed"], false);

    let (status, body) = send(&t.app, Method::GET, "/api/locations/pier-7", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pier 7");
    assert_eq!(body["rewardTokens"], 25);

    let (status, body) = send(&t.app, Method::GET, "/api/locations/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "not found");
}

#[tokio::test]
async fn claim_statuses_map_to_http_codes() {
    let t = api(false);

    // ~12 km north of the pier
    let (status, body) = claim(&t.app, "0xalice", 40.8208, -74.0060).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "too far");
    assert!(body["distance"].as_f64().unwrap() > 10_000.0);

    let (status, body) = claim(&t.app, "0xalice", 40.7130, -74.0060).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "claimed");

    let (status, body) = claim(&t.app, "0xAlice", 40.7130, -74.0060).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "already claimed by you");

    let (status, body) = claim(&t.app, "0xbob", 40.7130, -74.0060).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "already claimed");
}

#[tokio::test]
async fn claim_rejects_bad_input() {
    let t = api(false);
    let (status, _) = send(
        &t.app,
        Method::POST,
        "/api/claim-location",
        Some(json!({ "walletAddress": "0xalice" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = claim(&t.app, "0xalice", 123.0, 0.0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.app,
        Method::POST,
        "/api/claim-location",
        Some(json!({
            "walletAddress": "0xalice",
            "locationId": "missing",
            "userLat": 40.0,
            "userLng": -74.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "not found");
}

#[tokio::test]
async fn third_up_vote_pays_the_claim_owner() {
    let t = api(false);
    send(
        &t.app,
        Method::POST,
        "/auth/wallet-login",
        Some(json!({ "walletAddress": "0xalice" })),
    )
    .await;
    claim(&t.app, "0xalice", 40.7130, -74.0060).await;

    let (status, body) = vote(&t.app, "0xalice", "up").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "cannot vote on own claim");

    let (status, body) = vote(&t.app, "0xv1", "up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consensus"]["state"], "pending");
    assert_eq!(body["consensus"]["needed"], 3);

    let (status, body) = vote(&t.app, "0xv1", "down").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "already voted");

    vote(&t.app, "0xv2", "up").await;
    let (status, body) = vote(&t.app, "0xv3", "up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["upVotes"], 3);
    assert_eq!(body["consensus"]["state"], "reached");
    assert_eq!(body["consensus"]["reward"]["result"], "rewarded");
    assert_eq!(body["consensus"]["reward"]["amount"], 25);

    let (_, body) = vote(&t.app, "0xv4", "up").await;
    assert_eq!(body["consensus"]["state"], "settled");
    assert_eq!(t.ledger.transfer_count(), 1);

    let (_, location) = send(&t.app, Method::GET, "/api/locations/pier-7", None).await;
    assert_eq!(location["rewarded"], true);
    assert_eq!(location["verified"], true);
    assert_eq!(location["cleaned"], true);
}

#[tokio::test]
async fn reward_without_wallet_on_file_is_reported() {
    let t = api(false);
    claim(&t.app, "0xalice", 40.7130, -74.0060).await;
    for voter in ["0xv1", "0xv2"] {
        vote(&t.app, voter, "up").await;
    }
    let (status, body) = vote(&t.app, "0xv3", "up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["consensus"]["reward"]["result"], "no_wallet_on_file");
    assert_eq!(t.ledger.transfer_count(), 0);
}

#[tokio::test]
async fn distance_endpoint_reports_rounded_metres() {
    let t = api(false);
    let (status, body) = send(
        &t.app,
        Method::GET,
        "/api/test-distance?lat1=40.7128&lng1=-74.0060&lat2=40.7218&lng2=-74.0060",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let metres = body["distanceInMeters"].as_f64().unwrap();
    assert!((950.0..=1050.0).contains(&metres));
    assert_eq!((metres * 100.0).round() / 100.0, metres);
    assert_eq!(body["isNearby"], true);

    let (status, _) = send(&t.app, Method::GET, "/api/test-distance?lat1=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_requires_a_claim() {
    let t = api(false);
    let upload = json!({ "afterPhotoUrl": "https://img.example/after.jpg" });

    let (status, _) = send(&t.app, Method::POST, "/api/upload-complete/pier-7", Some(upload.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    claim(&t.app, "0xalice", 40.7130, -74.0060).await;
    let (status, body) = send(&t.app, Method::POST, "/api/upload-complete/pier-7", Some(upload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["afterPhotoUrl"], "https://img.example/after.jpg");
    assert_eq!(body["location"]["afterImageUploaded"], true);

    let (_, mine) = send(&t.app, Method::GET, "/api/user/0xalice/locations", None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn login_then_profile_update() {
    let t = api(false);
    let login = json!({ "walletAddress": "0xCarol" });

    let (status, body) = send(&t.app, Method::POST, "/auth/wallet-login", Some(login.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isNewUser"], true);
    assert_eq!(body["userData"]["userId"], "0xcarol");

    let (_, body) = send(&t.app, Method::POST, "/auth/wallet-login", Some(login)).await;
    assert_eq!(body["isNewUser"], false);

    let (status, _) = send(
        &t.app,
        Method::PATCH,
        "/auth/update-profile",
        Some(json!({ "walletAddress": "0xcarol", "email": "c@example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &t.app,
        Method::PATCH,
        "/auth/update-profile",
        Some(json!({ "walletAddress": "0xcarol", "username": "carol", "email": "c@example.org" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userData"]["username"], "carol");
    assert_eq!(body["userData"]["email"], "c@example.org");
}

#[tokio::test]
async fn metrics_are_served_only_when_enabled() {
    let disabled = api(false);
    let (status, _) = send(&disabled.app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let enabled = api(true);
    claim(&enabled.app, "0xalice", 40.7130, -74.0060).await;
    let (status, body) = send(&enabled.app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("cleanchain_claims_total"));

    let (status, body) = send(&enabled.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ledger"], "null-ledger");
}
