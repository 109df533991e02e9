use serde::Deserialize;

/// Configuration for the read-only HTTP API.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Whether the API server is started alongside the poller.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Address and port for the HTTP server to listen on.
    #[serde(default = "default_api_server_listen_address")]
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), listen_address: default_api_server_listen_address() }
    }
}

fn default_enabled() -> bool {
    true
}

/// Provides the default value for api_server_listen_address.
fn default_api_server_listen_address() -> String {
    "0.0.0.0:8080".to_string()
}
