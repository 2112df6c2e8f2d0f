//! HTTP routes exercised in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use shift_roster::api::{self, AppState};

fn app() -> Router {
    api::router(Arc::new(AppState::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_and_info() {
    let app = app();
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");

    let (status, body) = send_json(&app, "GET", "/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["solverEngine"], "pumpkin-solver");
}

#[tokio::test]
async fn demo_data_routes() {
    let app = app();
    let (status, body) = send_json(&app, "GET", "/demo-data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["SMALL", "LARGE"]));

    let (status, body) = send_json(&app, "GET", "/demo-data/small", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["startDate"], "2025-11-02");
    assert_eq!(body["days"], 42);
    assert_eq!(body["employees"].as_array().map(Vec::len), Some(15));

    let (status, _) = send(&app, "GET", "/demo-data/HUGE", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_requests_are_rejected_before_solving() {
    let app = app();
    let empty = json!({"startDate": "2025-11-03", "days": 7, "employees": []});
    let (status, body) = send(&app, "POST", "/rosters", Some(empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(String::from_utf8_lossy(&body).contains("empty"));

    let bad_config = json!({
        "startDate": "2025-11-03",
        "days": 7,
        "employees": [{"name": "Amy"}],
        "config": {"worker_count": 0}
    });
    let (status, _) = send(&app, "POST", "/rosters", Some(bad_config)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send_json(&app, "GET", "/rosters", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let app = app();
    for (method, uri) in [
        ("GET", "/rosters/nope"),
        ("GET", "/rosters/nope/status"),
        ("DELETE", "/rosters/nope"),
    ] {
        let (status, _) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn infeasible_job_reports_reason() {
    let app = app();
    let request = json!({
        "startDate": "2025-11-03",
        "days": 7,
        "employees": [{"name": "Amy"}]
    });
    let (status, body) = send(&app, "POST", "/rosters", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    let id = String::from_utf8(body).unwrap();

    let mut job_status = Value::Null;
    for _ in 0..100 {
        let (status, body) = send_json(&app, "GET", &format!("/rosters/{id}/status"), None).await;
        assert_eq!(status, StatusCode::OK);
        job_status = body["status"].clone();
        if job_status != "SOLVING" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(job_status, "FAILED");

    let (_, job) = send_json(&app, "GET", &format!("/rosters/{id}"), None).await;
    assert_eq!(job["error"]["kind"], "INFEASIBLE");
    assert_eq!(job["error"]["stage"], "SCREEN");
    assert!(job["roster"].is_null());

    let (status, _) = send(&app, "DELETE", &format!("/rosters/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", &format!("/rosters/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validate_flags_night_without_rest() {
    let app = app();
    let body = json!({
        "request": {
            "startDate": "2025-11-03",
            "days": 7,
            "employees": [{"name": "Amy"}]
        },
        "roster": {
            "startDate": "2025-11-03",
            "dates": [],
            "rows": [{
                "employee": "Amy",
                "shifts": ["NIGHT_SHIFT", "DAY_SHIFT", "REST", "REST", "REST", "REST", "REST"]
            }]
        }
    });
    let (status, response) = send_json(&app, "PUT", "/rosters/validate", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["valid"], false);

    let kinds: Vec<&str> = response["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"NIGHT_REST"), "{kinds:?}");
    assert_eq!(response["summaries"][0]["workedDays"], 2);
}
