use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use seqpool::http::{router, HttpState};
use seqpool::scheduler::JobRegistry;

fn create_test_app() -> (Router, Arc<JobRegistry>) {
    let registry = Arc::new(JobRegistry::new());
    let app = router(HttpState {
        registry: registry.clone(),
    });
    (app, registry)
}

fn add_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/add")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_add_returns_scheduled_job() {
    let (app, registry) = create_test_app();

    let response = app
        .oneshot(add_request(r#"{"n":10,"d":1,"n1":0,"I":2,"TTL":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["n"], 10);
    assert_eq!(json["d"], 1.0);
    assert_eq!(json["n1"], 0.0);
    assert_eq!(json["I"], 2.0);
    assert_eq!(json["TTL"], 5.0);
    assert_eq!(json["numInQueue"], 1);
    assert_eq!(json["status"], "scheduled");
    assert!(json["scheduledTime"].as_str().unwrap().ends_with('Z'));
    assert!(json.get("startTime").is_none());

    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_add_rejects_negative_interval() {
    let (app, registry) = create_test_app();

    let response = app
        .oneshot(add_request(r#"{"n":1,"d":1,"n1":0,"I":-1,"TTL":5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("I"));
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_add_rejects_negative_ttl() {
    let (app, _registry) = create_test_app();

    let response = app
        .oneshot(add_request(r#"{"n":1,"d":1,"n1":0,"I":1,"TTL":-0.5}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_rejects_negative_count() {
    let (app, registry) = create_test_app();

    let response = app
        .oneshot(add_request(r#"{"n":-3,"d":1,"n1":0,"I":1,"TTL":1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_add_rejects_malformed_body() {
    let (app, _registry) = create_test_app();

    let response = app.oneshot(add_request("{not json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_rejects_missing_fields() {
    let (app, _registry) = create_test_app();

    let response = app.oneshot(add_request(r#"{"n":1}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_empty() {
    let (app, _registry) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/get").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_get_lists_jobs_by_id() {
    let (app, _registry) = create_test_app();

    for n in [3, 1, 2] {
        let body = json!({"n": n, "d": 1, "n1": 0, "I": 1, "TTL": 1}).to_string();
        let response = app.clone().oneshot(add_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(Request::builder().uri("/get").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let jobs = json.as_array().unwrap();
    assert_eq!(jobs.len(), 3);

    let ids: Vec<u64> = jobs.iter().map(|j| j["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    let counts: Vec<u64> = jobs.iter().map(|j| j["n"].as_u64().unwrap()).collect();
    assert_eq!(counts, vec![3, 1, 2]);
    let positions: Vec<u64> = jobs
        .iter()
        .map(|j| j["numInQueue"].as_u64().unwrap())
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _registry) = create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
