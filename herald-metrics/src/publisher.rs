use prometheus::{IntCounter, Opts, Registry};

use crate::MetricsError;

#[derive(Debug, Clone)]
pub struct PublisherMetrics {
    published: IntCounter,
}

impl PublisherMetrics {
    pub(crate) fn register(registry: &Registry) -> Result<Self, MetricsError> {
        let published = IntCounter::with_opts(Opts::new(
            "email_published_rabbitmq_messages_total",
            "The total number of published RabbitMQ messages",
        ))?;
        registry.register(Box::new(published.clone()))?;

        Ok(Self { published })
    }

    pub fn record_published(&self) {
        self.published.inc();
    }

    pub fn published(&self) -> u64 {
        self.published.get()
    }
}
