use crate::helpers::*;

#[tokio::test]
async fn refresh_triggers_a_new_tick() {
    let server = TestServer::new(&[("a.csv", SNAPSHOT_A)]).await;
    server.wait_for_ticks(1).await;
    assert_eq!(server.store.len(), 2);

    write_snapshot(server.dir.path(), "b.csv", SNAPSHOT_B);
    let resp = server.post("/refresh").await;

    assert_eq!(resp.status(), 202);
    server.wait_for_ticks(2).await;
    assert_eq!(server.store.len(), 3);

    server.cleanup();
}

#[tokio::test]
async fn refresh_is_rejected_once_the_poller_is_stopped() {
    let server = TestServer::new(&[]).await;
    server.poller.stop();

    let resp = server.post("/refresh").await;

    assert_eq!(resp.status(), 503);
    let body: serde_json::Value = resp.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Poller is stopped");

    server.cleanup();
}
