use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, state::AppState};
use dispatch_core::{LocationRegistry, Route, RouteCatalog};

fn setup_app_with(catalog: RouteCatalog) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        Config::default(),
        LocationRegistry::builtin(),
        Some(catalog),
    ));
    let app = api::routes().with_state(state.clone());
    (app, state)
}

fn setup_app() -> (axum::Router, Arc<AppState>) {
    setup_app_with(RouteCatalog::empty())
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_check() {
    let (app, _state) = setup_app();
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tick_base_ms"], 1000);
    assert_eq!(body["clock_running"], false);
}

#[tokio::test]
async fn submit_order_stays_pending_until_start() {
    let (app, state) = setup_app();

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/orders",
            json!({
                "start_location_id": "canteen_1",
                "end_location_id": "dorm_1",
                "description": "lunch"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order = read_json(res).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["start_point"], json!([116.315263, 40.0053343]));
    let order_id = order["id"].as_str().unwrap().to_string();

    let res = app.clone().oneshot(get(&format!("/v1/orders/{}", order_id))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(post_json("/v1/simulation/start", json!({ "speed": 2 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["running"], true);
    assert_eq!(snapshot["speed_multiplier"], 2.0);
    assert_eq!(snapshot["orders"][0]["status"], "assigned");
    assert_eq!(snapshot["drones"][0]["path"].as_array().unwrap().len(), 21);
    assert_eq!(snapshot["drones"][0]["altitude_m"], 75.0);
    assert!(state.clock_running().await);

    let res = app.oneshot(post_json("/v1/simulation/reset", json!({}))).await.unwrap();
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["running"], false);
    assert!(snapshot["orders"].as_array().unwrap().is_empty());
    assert!(!state.clock_running().await);
}

#[tokio::test]
async fn invalid_orders_are_rejected_without_state_change() {
    let (app, state) = setup_app();

    for body in [
        json!({ "start_location_id": "", "end_location_id": "dorm_1" }),
        json!({ "start_location_id": "canteen_1", "end_location_id": "dorm_99" }),
        json!({ "start_location_id": "dorm_1", "end_location_id": "dorm_2" }),
        json!({ "end_location_id": "dorm_2" }),
    ] {
        let res = app.clone().oneshot(post_json("/v1/orders", body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err = read_json(res).await;
        assert!(err["error"].is_string());
    }

    assert!(state.get_orders().is_empty());
}

#[tokio::test]
async fn manual_dispatch_rejects_second_attempt() {
    let (app, state) = setup_app();
    let order = state
        .submit_order(&dispatch_core::OrderRequest::new("gate_2", "dorm_3"))
        .unwrap();
    let uri = format!("/v1/orders/{}/dispatch", order.id);

    let res = app.clone().oneshot(post_json(&uri, json!({}))).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let drone = read_json(res).await;
    assert_eq!(drone["order_id"], order.id.as_str());
    assert_eq!(drone["status"], "assigned");

    let res = app.clone().oneshot(post_json(&uri, json!({}))).await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(state.get_drones().len(), 1);

    let res = app
        .oneshot(post_json("/v1/orders/ORDER-MISSING/dispatch", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (app, _state) = setup_app();
    let res = app.oneshot(get("/v1/orders/ORDER-NOPE")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_speed_is_rejected() {
    let (app, _state) = setup_app();

    let req = Request::builder()
        .method("PUT")
        .uri("/v1/simulation/speed")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "speed": 0 }).to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(post_json("/v1/simulation/start", json!({ "speed": -1 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tiny_speed_is_rejected_while_running() {
    let (app, state) = setup_app();

    let res = app
        .clone()
        .oneshot(post_json("/v1/simulation/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let req = Request::builder()
        .method("PUT")
        .uri("/v1/simulation/speed")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "speed": 1e-300 }).to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = read_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("minimum"));

    // The running clock and its speed are untouched.
    assert!(state.clock_running().await);
    assert_eq!(state.snapshot().speed_multiplier, 1.0);

    let res = app
        .oneshot(post_json("/v1/simulation/start", json!({ "speed": 1e-300 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(state.clock_running().await);

    state.stop_simulation().await;
}

#[tokio::test]
async fn route_stats_and_locations() {
    let registry = LocationRegistry::builtin();
    let start = registry.resolve("gate_1").unwrap().coordinates;
    let end = registry.resolve("dorm_1").unwrap().coordinates;
    let catalog = RouteCatalog::new([
        ("canteen_to_dorm", vec![]),
        ("gate_to_dorm", vec![Route::new(vec![start, end], Some(100.0))]),
    ]);
    let (app, state) = setup_app_with(catalog);

    let res = app.clone().oneshot(get("/v1/routes/stats")).await.unwrap();
    let stats = read_json(res).await;
    assert_eq!(stats["total_routes"], 1);
    assert_eq!(stats["categories"][1]["name"], "gate_to_dorm");

    let res = app.oneshot(get("/v1/locations")).await.unwrap();
    let locations = read_json(res).await;
    assert_eq!(locations["dorms"].as_array().unwrap().len(), 3);

    // the catalog route is picked up on dispatch
    let order = state
        .submit_order(&dispatch_core::OrderRequest::new("gate_1", "dorm_1"))
        .unwrap();
    let drone = state.dispatch_order(&order.id).unwrap();
    assert_eq!(drone.altitude_m, 100.0);
    assert_eq!(drone.path.len(), 2);
}

#[tokio::test]
async fn stop_keeps_orders_and_halts_clock() {
    let (app, state) = setup_app();
    state
        .submit_order(&dispatch_core::OrderRequest::new("canteen_2", "dorm_2"))
        .unwrap();

    app.clone()
        .oneshot(post_json("/v1/simulation/start", json!({})))
        .await
        .unwrap();
    let res = app.clone().oneshot(post_json("/v1/simulation/stop", json!({}))).await.unwrap();
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["running"], false);
    assert_eq!(snapshot["orders"].as_array().unwrap().len(), 1);
    assert!(!state.clock_running().await);

    // orders placed while stopped are not dispatched
    state
        .submit_order(&dispatch_core::OrderRequest::new("canteen_3", "dorm_1"))
        .unwrap();
    let res = app.oneshot(get("/v1/snapshot")).await.unwrap();
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["orders"][1]["status"], "pending");
    assert_eq!(snapshot["drones"].as_array().unwrap().len(), 1);
}
