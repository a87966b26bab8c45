use prometheus::{Encoder, Registry, TextEncoder};

use crate::{ConsumerMetrics, MetricsError, PublisherMetrics, RpcMetrics};

/// Owns every herald instrument.
///
/// Cloning is cheap; clones share the same underlying counters.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    consumer: ConsumerMetrics,
    publisher: PublisherMetrics,
    rpc: RpcMetrics,
}

impl MetricsRegistry {
    pub fn new(namespace: &str) -> Result<Self, MetricsError> {
        let registry = Registry::new();
        let consumer = ConsumerMetrics::register(&registry)?;
        let publisher = PublisherMetrics::register(&registry)?;
        let rpc = RpcMetrics::register(&registry, namespace)?;

        Ok(Self {
            registry,
            consumer,
            publisher,
            rpc,
        })
    }

    pub const fn consumer(&self) -> &ConsumerMetrics {
        &self.consumer
    }

    pub const fn publisher(&self) -> &PublisherMetrics {
        &self.publisher
    }

    pub const fn rpc(&self) -> &RpcMetrics {
        &self.rpc
    }

    /// Renders every registered family in the text exposition format.
    pub fn gather(&self) -> Result<String, MetricsError> {
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;

        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn registries_are_independent() {
        let first = MetricsRegistry::new("herald").expect("registry");
        let second = MetricsRegistry::new("herald").expect("registry");

        first.consumer().record_incoming();
        first.consumer().record_success();

        assert_eq!(first.consumer().incoming(), 1);
        assert_eq!(first.consumer().success(), 1);
        assert_eq!(second.consumer().incoming(), 0);
    }

    #[test]
    fn clones_share_counters() {
        let registry = MetricsRegistry::new("herald").expect("registry");
        let clone = registry.clone();

        clone.publisher().record_published();
        clone.consumer().record_error();

        assert_eq!(registry.publisher().published(), 1);
        assert_eq!(registry.consumer().error(), 1);
    }

    #[test]
    fn gather_renders_exposition_format() {
        let registry = MetricsRegistry::new("herald").expect("registry");
        registry.consumer().record_incoming();
        registry.consumer().record_incoming();
        registry.publisher().record_published();

        let output = registry.gather().expect("gather");

        assert!(output.contains("# TYPE emails_incoming_rabbitmq_messages_total counter"));
        assert!(output.contains("emails_incoming_rabbitmq_messages_total 2"));
        assert!(output.contains("emails_success_incoming_rabbitmq_messages_total 0"));
        assert!(output.contains("emails_error_incoming_rabbitmq_messages_total 0"));
        assert!(output.contains("email_published_rabbitmq_messages_total 1"));
    }

    #[test]
    fn rpc_observations_are_labelled() {
        let registry = MetricsRegistry::new("mail").expect("registry");
        let rpc = registry.rpc();

        let send = "/email_service.EmailService/SendEmails";
        let find = "/email_service.EmailService/FindEmailById";
        rpc.observe(0, "POST", send, Duration::from_millis(3));
        rpc.observe(5, "POST", find, Duration::from_millis(1));

        assert_eq!(rpc.hits_total(), 2);
        assert_eq!(rpc.hits(5, "POST", find), 1);

        let output = registry.gather().expect("gather");
        assert!(output.contains("mail_hits_total 2"));
        assert!(output.contains("mail_times_bucket"));
    }
}
