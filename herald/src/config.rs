use std::path::{Path, PathBuf};

use anyhow::Context;
use herald_broker::BrokerConfig;
use herald_dispatch::MailerConfig;
use herald_metrics::MetricsConfig;
use herald_rpc::RpcConfig;
use herald_store::StoreConfig;
use serde::Deserialize;

pub const CONFIG_ENV: &str = "HERALD_CONFIG";

const DEFAULT_PATHS: [&str; 2] = ["./herald.config.ron", "/etc/herald/herald.config.ron"];

#[derive(Debug, Deserialize)]
pub struct Herald {
    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub mailer: MailerConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    /// How long services get to finish in-flight work once draining starts
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Upper bound on each resource closer
    #[serde(default = "default_closer_timeout_secs")]
    pub closer_timeout_secs: u64,
}

const fn default_shutdown_grace_secs() -> u64 {
    30
}

const fn default_closer_timeout_secs() -> u64 {
    10
}

impl Default for Herald {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            store: StoreConfig::default(),
            mailer: MailerConfig::default(),
            rpc: RpcConfig::default(),
            metrics: MetricsConfig::default(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            closer_timeout_secs: default_closer_timeout_secs(),
        }
    }
}

impl Herald {
    pub fn from_ron(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_ron(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }
}

/// Find the configuration file using the following precedence:
/// 1. An explicitly given path (`--config`)
/// 2. `HERALD_CONFIG` environment variable
/// 3. ./herald.config.ron (current working directory)
/// 4. /etc/herald/herald.config.ron (system-wide config)
pub fn find_config_file(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("Config file does not exist: {}", path.display());
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("{CONFIG_ENV} points to non-existent file: {}", path.display());
    }

    if let Some(path) = DEFAULT_PATHS.iter().map(PathBuf::from).find(|path| path.exists()) {
        return Ok(path);
    }

    let paths_tried = DEFAULT_PATHS
        .iter()
        .map(|path| format!("  - {path}"))
        .collect::<Vec<_>>()
        .join("\n");

    anyhow::bail!(
        "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{paths_tried}"
    )
}

#[cfg(test)]
mod tests {
    use herald_store::StoreConfig;

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let herald = Herald::from_ron("()").expect("defaults");

        assert_eq!(herald.shutdown_grace_secs, 30);
        assert_eq!(herald.closer_timeout_secs, 10);
        assert_eq!(herald.broker.worker_pool_size, 1);
        assert_eq!(herald.metrics.path, "/metrics");
        assert!(!herald.rpc.enqueue_send_requests);
        assert!(matches!(herald.store, StoreConfig::Postgres(_)));
    }

    #[test]
    fn sections_override_defaults() {
        let herald = Herald::from_ron(
            r#"(
                broker: (worker_pool_size: 4, prefetch_count: 8),
                store: Memory,
                rpc: (listen_address: "127.0.0.1:6001", enqueue_send_requests: true),
                shutdown_grace_secs: 5,
            )"#,
        )
        .expect("valid");

        assert_eq!(herald.broker.worker_pool_size, 4);
        assert_eq!(herald.broker.prefetch_count, 8);
        assert!(matches!(herald.store, StoreConfig::Memory));
        assert_eq!(herald.rpc.listen_address, "127.0.0.1:6001");
        assert!(herald.rpc.enqueue_send_requests);
        assert_eq!(herald.shutdown_grace_secs, 5);
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(Herald::from_ron("(store: Sqlite)").is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = find_config_file(Some(PathBuf::from("/nonexistent/herald.config.ron")))
            .expect_err("missing");

        assert!(err.to_string().contains("/nonexistent/herald.config.ron"));
    }
}
