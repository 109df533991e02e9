use crate::helpers::*;

#[tokio::test]
async fn status_endpoint_returns_status_json() {
    let server = TestServer::new(&[("a.csv", SNAPSHOT_A)]).await;
    server.wait_for_ticks(1).await;

    let resp = server.get("/status").await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["poller_state"], "idle");
    assert!(body["uptime_secs"].as_u64().is_some());
    assert_eq!(body["buckets"], 2);
    assert_eq!(body["max_buckets"], 10080);
    assert_eq!(body["first_key"], "00:00");
    assert_eq!(body["last_key"], "00:01");
    assert_eq!(body["ticks_completed"], 1);
    assert_eq!(body["ticks_failed"], 0);
    assert_eq!(body["last_tick"]["tick"], 1);
    assert_eq!(body["last_tick"]["report"]["inserted"], 2);

    server.cleanup();
}

#[tokio::test]
async fn status_endpoint_reports_stopped_poller() {
    let server = TestServer::new(&[]).await;
    server.poller.stop();

    let body: serde_json::Value =
        server.get("/status").await.json().await.expect("Failed to parse JSON");

    assert_eq!(body["poller_state"], "stopped");

    server.cleanup();
}
