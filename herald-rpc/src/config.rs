use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_tcp_keepalive_secs")]
    pub tcp_keepalive_secs: u64,

    /// Interval between HTTP/2 keepalive pings
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,

    /// How long to wait for a keepalive ping to be acknowledged before the
    /// connection is closed
    #[serde(default = "default_keepalive_timeout_secs")]
    pub keepalive_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// When set, `SendEmails` publishes the validated email to the queue.
    /// Otherwise it only validates.
    #[serde(default)]
    pub enqueue_send_requests: bool,
}

fn default_listen_address() -> String {
    "0.0.0.0:5001".to_string()
}

const fn default_tcp_keepalive_secs() -> u64 {
    60
}

const fn default_keepalive_interval_secs() -> u64 {
    300
}

const fn default_keepalive_timeout_secs() -> u64 {
    15
}

const fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            tcp_keepalive_secs: default_tcp_keepalive_secs(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            keepalive_timeout_secs: default_keepalive_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            enqueue_send_requests: false,
        }
    }
}

impl RpcConfig {
    pub const fn tcp_keepalive(&self) -> Duration {
        Duration::from_secs(self.tcp_keepalive_secs)
    }

    pub const fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub const fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
