use std::time::Duration;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::MetricsError;

const LABELS: [&str; 3] = ["status", "method", "path"];

/// Per-call counters and latency for the RPC surface, labelled by gRPC status
/// code, HTTP method and request path.
#[derive(Debug, Clone)]
pub struct RpcMetrics {
    hits_total: IntCounter,
    hits: IntCounterVec,
    times: HistogramVec,
}

impl RpcMetrics {
    pub(crate) fn register(registry: &Registry, namespace: &str) -> Result<Self, MetricsError> {
        let hits_total = IntCounter::with_opts(Opts::new(
            format!("{namespace}_hits_total"),
            "The total number of RPC calls",
        ))?;
        let hits = IntCounterVec::new(
            Opts::new(format!("{namespace}_hits"), "RPC calls by outcome"),
            &LABELS,
        )?;
        let times = HistogramVec::new(
            HistogramOpts::new(format!("{namespace}_times"), "RPC latency in seconds"),
            &LABELS,
        )?;

        registry.register(Box::new(hits_total.clone()))?;
        registry.register(Box::new(hits.clone()))?;
        registry.register(Box::new(times.clone()))?;

        Ok(Self {
            hits_total,
            hits,
            times,
        })
    }

    pub fn observe(&self, status: i32, method: &str, path: &str, elapsed: Duration) {
        let status = status.to_string();
        let labels = [status.as_str(), method, path];

        self.hits_total.inc();
        self.hits.with_label_values(&labels).inc();
        self.times
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    pub fn hits_total(&self) -> u64 {
        self.hits_total.get()
    }

    pub fn hits(&self, status: i32, method: &str, path: &str) -> u64 {
        let status = status.to_string();
        self.hits
            .with_label_values(&[status.as_str(), method, path])
            .get()
    }
}
