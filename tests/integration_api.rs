//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use heatloss_sim::analysis::{CoastDownAnalyzer, resolve_heat_loss_factor};
use heatloss_sim::api::{AppState, router};
use heatloss_sim::config::EngineConfig;

/// Analyzes the reference home and returns the API state.
fn build_api_state(config: EngineConfig) -> Arc<AppState> {
    let samples = common::reference_home(42).generate();
    let estimate = CoastDownAnalyzer::new(config.analysis.clone())
        .analyze(&samples)
        .expect("analysis should succeed");
    let heat_loss =
        resolve_heat_loss_factor(&config.heat_loss, config.analysis.square_feet, Some(&estimate));
    Arc::new(AppState {
        equipment: config.equipment_spec(),
        config,
        estimate: Some(estimate),
        heat_loss: Some(heat_loss),
    })
}

async fn send(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn heat_loss_returns_cached_estimate() {
    let state = build_api_state(EngineConfig::baseline());
    let req = Request::builder()
        .uri("/heat-loss")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(state, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "analyzer");
    let k = json["heatLossFactor"].as_f64().unwrap();
    assert!((k - common::REFERENCE_K).abs() / common::REFERENCE_K < 0.05);
    assert!(json["estimate"].get("heatLossAt70F").is_some());
    assert!(json["estimate"].get("balancePointF").is_some());
}

#[tokio::test]
async fn cost_estimate_with_temperature_array() {
    let state = build_api_state(EngineConfig::baseline());
    let temps: Vec<f64> = (0..48).map(|h| 20.0 + f64::from(h % 24)).collect();
    let (status, json) = send(
        state,
        post(
            "/cost-estimate",
            serde_json::json!({
                "outdoor_temps_array": temps,
                "target_temp": 70,
                "duration_hours": 36.5
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let breakdown = json["breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 37);
    assert_eq!(breakdown[36]["durationHours"], 0.5);
}

#[tokio::test]
async fn cost_estimate_rejects_two_temperature_sources() {
    let state = build_api_state(EngineConfig::baseline());
    let (status, json) = send(
        state,
        post(
            "/cost-estimate",
            serde_json::json!({
                "outdoor_temp": 30,
                "outdoor_temps_array": [30, 31],
                "target_temp": 70,
                "duration_hours": 2
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("only one"));
}

#[tokio::test]
async fn malformed_cost_estimate_body_uses_failure_envelope() {
    let state = build_api_state(EngineConfig::baseline());
    let (status, json) = send(
        state.clone(),
        post(
            "/cost-estimate",
            serde_json::json!({ "outdoor_temp": 45, "duration_hours": 24 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("target_temp"));
    assert!(json.get("weeklyCost").is_none());

    let req = Request::builder()
        .method("POST")
        .uri("/cost-estimate")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn oversized_duration_is_rejected() {
    let state = build_api_state(EngineConfig::baseline());
    let (status, json) = send(
        state,
        post(
            "/cost-estimate",
            serde_json::json!({
                "outdoor_temp": 45,
                "target_temp": 70,
                "duration_hours": 1e13
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("must not exceed"));
}

#[tokio::test]
async fn daily_forecast_groups_by_local_day() {
    let state = build_api_state(EngineConfig::baseline());
    let (status, json) = send(
        state,
        post(
            "/daily-forecast",
            serde_json::json!({
                "outdoor_temp": 25,
                "target_temp": 68,
                "duration_hours": 168
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let days = json["report"]["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert!(json["report"]["totalDays"].as_u64().unwrap() >= 7);
    assert!(days.iter().all(|d| d["balanced"] == true));
}

#[tokio::test]
async fn monthly_forecast_prices_each_day() {
    let state = build_api_state(EngineConfig::baseline());
    let days: Vec<Value> = (1..=30)
        .map(|d| {
            serde_json::json!({
                "date": format!("2024-01-{d:02}"),
                "lowF": 18,
                "highF": 36
            })
        })
        .collect();
    let (status, json) = send(
        state,
        post(
            "/monthly-forecast",
            serde_json::json!({ "days": days, "utcOffsetMinutes": -300 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["days"], 30);
    let total = json["totalCost"].as_f64().unwrap();
    let parts = json["hvacCost"].as_f64().unwrap()
        + json["baseloadCost"].as_f64().unwrap()
        + json["fixedCost"].as_f64().unwrap();
    assert!((total - parts).abs() < 1e-6);
    assert_eq!(json["daily"]["days"].as_array().unwrap().len(), 30);
}
