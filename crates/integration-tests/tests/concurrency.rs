//! Bursts of reports against a single user-day, over HTTP.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::task::JoinSet;

use peerbook_integration_tests::{TestContext, new_year_morning, report_body};

async fn burst(base_url: &str, devices: Vec<String>) -> Vec<(StatusCode, Value)> {
    let client = Client::new();
    let mut tasks = JoinSet::new();

    for device in devices {
        let client = client.clone();
        let url = format!("{base_url}/api/client/first_install");
        tasks.spawn(async move {
            let resp = client
                .post(url)
                .json(&report_body(&device, 42))
                .send()
                .await
                .unwrap();
            let status = resp.status();
            (status, resp.json::<Value>().await.unwrap())
        });
    }

    tasks.join_all().await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_devices_share_one_new_bucket() {
    let ctx = TestContext::at(new_year_morning());
    let base_url = ctx.serve().await;

    let devices = (0..24).map(|i| format!("dev-{i}")).collect();
    let results = burst(&base_url, devices).await;

    assert!(results.iter().all(|(s, _)| *s == StatusCode::CREATED));
    let buckets: HashSet<i64> = results
        .iter()
        .map(|(_, body)| body["data"]["collection_id"].as_i64().unwrap())
        .collect();
    assert_eq!(buckets.len(), 1);
    assert_eq!(ctx.store.collection_count(), 1);
    assert_eq!(ctx.store.entry_count(), 24);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_reports_create_once() {
    let ctx = TestContext::at(new_year_morning());
    let base_url = ctx.serve().await;

    let devices = (0..12).map(|_| "dev-same".to_owned()).collect();
    let results = burst(&base_url, devices).await;

    let created = results
        .iter()
        .filter(|(s, _)| *s == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1);
    assert!(
        results
            .iter()
            .all(|(s, body)| (*s == StatusCode::CREATED || *s == StatusCode::OK)
                && body["code"] == 0)
    );
    assert_eq!(ctx.store.entry_count(), 1);
    assert_eq!(ctx.store.collection_count(), 1);
}
