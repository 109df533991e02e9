use std::{net::SocketAddr, num::NonZeroUsize, path::Path, sync::Arc, time::Duration};

use countwatch::{
    config::{AppConfig, ServerConfig, SourceConfig},
    engine::{Poller, PollerHandle},
    http_server::{self, ApiState},
    providers::DirectorySnapshotSource,
    store::SeriesStore,
};
use reqwest::Client;
use tempfile::TempDir;
use tokio::task;
use tokio_util::sync::CancellationToken;

pub const SNAPSHOT_A: &str = "min,request_count,is_anomaly\n00:00,12,False\n00:01,300,True\n";
pub const SNAPSHOT_B: &str = "min,request_count,is_anomaly\n00:01,310,True\n00:02,15,False\n";

pub fn write_snapshot(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).expect("Failed to write snapshot");
}

pub fn create_test_config(dir: &Path) -> AppConfig {
    AppConfig {
        polling_interval_ms: Duration::from_secs(3600),
        source: SourceConfig::Directory { path: dir.to_path_buf(), extension: "csv".into() },
        ..Default::default()
    }
}

pub struct TestServer {
    pub address: SocketAddr,
    pub server_handle: task::JoinHandle<()>,
    pub client: Client,
    pub poller: PollerHandle,
    pub store: Arc<SeriesStore>,
    pub dir: TempDir,
    token: CancellationToken,
}

impl TestServer {
    /// Starts a server over a directory holding `snapshots`. The poller is
    /// not scheduled; ticks run through `tick` or `POST /refresh`.
    pub async fn new(snapshots: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        for (name, content) in snapshots {
            write_snapshot(dir.path(), name, content);
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get address");
        drop(listener); // Release port for the app to use

        let config = create_test_config(dir.path());
        let token = CancellationToken::new();
        let store = Arc::new(SeriesStore::new(NonZeroUsize::new(config.max_buckets).unwrap()));
        let source = Arc::new(DirectorySnapshotSource::new(dir.path(), "csv"));
        let poller = Poller::new(&config, source, Arc::clone(&store), token.clone());
        let handle = poller.handle();

        let state = ApiState { store: Arc::clone(&store), poller: handle.clone() };
        let server_config = ServerConfig { listen_address: addr.to_string(), ..Default::default() };
        let server_token = token.clone();
        let server_handle = task::spawn(async move {
            http_server::run_server(&server_config, state, server_token)
                .await
                .expect("Server failed");
        });

        // Keeps the kick receiver alive so POST /refresh is accepted.
        task::spawn(poller.run());

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(300)).await;

        Self {
            address: addr,
            server_handle,
            client: Client::new(),
            poller: handle,
            store,
            dir,
            token,
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        let url = format!("http://{}{}", self.address, path);
        self.client.get(&url).send().await.expect("Request failed")
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        let url = format!("http://{}{}", self.address, path);
        self.client.post(&url).send().await.expect("Request failed")
    }

    /// Waits until the poller has completed `n` ticks.
    pub async fn wait_for_ticks(&self, n: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.poller.metrics().snapshot().await.ticks_completed < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Poller did not complete ticks in time");
    }

    pub fn cleanup(self) {
        self.token.cancel();
        self.server_handle.abort();
    }
}
