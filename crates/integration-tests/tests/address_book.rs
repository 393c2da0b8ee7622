//! Integration tests for the address book read endpoints.
//!
//! These drive the router directly with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use peerbook_integration_tests::{TestContext, new_year_morning, report_body};

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn report(router: &Router, device: &str) -> StatusCode {
    let request = Request::post("/api/client/first_install")
        .header("content-type", "application/json")
        .body(Body::from(report_body(device, 42).to_string()))
        .unwrap();
    send(router, request).await.0
}

#[tokio::test]
async fn test_collections_newest_first_with_counts() {
    let day_one = TestContext::at(new_year_morning());
    let day_two = TestContext::with_store(
        day_one.store.clone(),
        new_year_morning() + Duration::days(1),
    );

    assert_eq!(report(&day_one.router, "dev-1").await, StatusCode::CREATED);
    assert_eq!(report(&day_one.router, "dev-2").await, StatusCode::CREATED);
    assert_eq!(report(&day_two.router, "dev-3").await, StatusCode::CREATED);
    // Already filed on day one; stays there.
    assert_eq!(report(&day_two.router, "dev-1").await, StatusCode::OK);

    let (status, body) = get(&day_two.router, "/api/address_book/42/collections").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["user_id"], 42);
    let collections = body["data"]["collections"].as_array().unwrap();
    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0]["label"], "2024-01-02");
    assert_eq!(collections[0]["device_count"], 1);
    assert_eq!(collections[1]["label"], "2024-01-01");
    assert_eq!(collections[1]["device_count"], 2);
}

#[tokio::test]
async fn test_devices_in_bucket_oldest_first() {
    let ctx = TestContext::at(new_year_morning());
    report(&ctx.router, "dev-b").await;
    report(&ctx.router, "dev-a").await;

    let (status, body) = get(
        &ctx.router,
        "/api/address_book/42/collections/2024-01-01/devices",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["label"], "2024-01-01");
    let ids: Vec<&str> = body["data"]["devices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["device_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["dev-b", "dev-a"]);
}

#[tokio::test]
async fn test_missing_bucket_is_empty_list() {
    let ctx = TestContext::at(new_year_morning());

    let (status, body) = get(
        &ctx.router,
        "/api/address_book/42/collections/2023-06-30/devices",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["devices"], Value::Array(Vec::new()));
    assert_eq!(ctx.store.collection_count(), 0);
}

#[tokio::test]
async fn test_read_endpoint_errors() {
    let ctx = TestContext::at(new_year_morning());

    let (status, body) = get(&ctx.router, "/api/address_book/7/collections").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 102);

    let (status, body) = get(&ctx.router, "/api/address_book/abc/collections").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 101);
    assert_eq!(body["data"]["errors"][0]["field"], "user_id");

    let (status, body) = get(
        &ctx.router,
        "/api/address_book/42/collections/2024-1-1/devices",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["data"]["errors"][0]["field"], "label");

    ctx.store.set_unavailable(true);
    let (status, body) = get(&ctx.router, "/api/address_book/42/collections").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], 103);
}

#[tokio::test]
async fn test_health_without_pool_is_ready() {
    let ctx = TestContext::at(new_year_morning());

    for uri in ["/health", "/health/ready"] {
        let response = ctx
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
