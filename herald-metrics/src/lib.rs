//! Metrics for herald
//!
//! All instruments live in an explicitly constructed [`MetricsRegistry`] which
//! is threaded through component constructors. Nothing is registered globally,
//! so tests can build as many independent registries as they like.

mod config;
mod consumer;
mod error;
mod publisher;
mod registry;
mod rpc;
mod server;

pub use config::MetricsConfig;
pub use consumer::ConsumerMetrics;
pub use error::MetricsError;
pub use publisher::PublisherMetrics;
pub use registry::MetricsRegistry;
pub use rpc::RpcMetrics;
pub use server::MetricsServer;
