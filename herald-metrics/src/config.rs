//! Metrics configuration

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Address the scrape endpoint binds to, e.g. `0.0.0.0:7070`
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Route serving the exposition output
    #[serde(default = "default_path")]
    pub path: String,

    /// Prefix for the per-call RPC instruments, usually the service name
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_listen_address() -> String {
    "0.0.0.0:7070".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_namespace() -> String {
    "herald".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            path: default_path(),
            namespace: default_namespace(),
        }
    }
}
