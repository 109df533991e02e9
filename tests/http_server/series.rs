use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn series_endpoint_returns_merged_points_in_key_order() {
    let server = TestServer::new(&[("a.csv", SNAPSHOT_A), ("b.csv", SNAPSHOT_B)]).await;
    server.wait_for_ticks(1).await;

    let resp = server.get("/series").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(
        body,
        json!([
            {"key": "00:00", "count": 12},
            {"key": "00:01", "count": 310},
            {"key": "00:02", "count": 15},
        ])
    );

    server.cleanup();
}

#[tokio::test]
async fn anomalies_endpoint_returns_flagged_points_only() {
    let server = TestServer::new(&[("a.csv", SNAPSHOT_A), ("b.csv", SNAPSHOT_B)]).await;
    server.wait_for_ticks(1).await;

    let resp = server.get("/anomalies").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body, json!([{"key": "00:01", "count": 310}]));

    server.cleanup();
}

#[tokio::test]
async fn series_endpoint_is_empty_without_snapshots() {
    let server = TestServer::new(&[]).await;
    server.wait_for_ticks(1).await;

    let body: serde_json::Value =
        server.get("/series").await.json().await.expect("Failed to parse JSON");

    assert_eq!(body, json!([]));

    server.cleanup();
}
