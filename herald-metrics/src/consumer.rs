use prometheus::{IntCounter, Opts, Registry};

use crate::MetricsError;

/// Counters for deliveries taken off the queue.
///
/// Every delivery increments `incoming`, then exactly one of `success` (acked)
/// or `error` (rejected).
#[derive(Debug, Clone)]
pub struct ConsumerMetrics {
    incoming: IntCounter,
    success: IntCounter,
    error: IntCounter,
}

impl ConsumerMetrics {
    pub(crate) fn register(registry: &Registry) -> Result<Self, MetricsError> {
        let incoming = IntCounter::with_opts(Opts::new(
            "emails_incoming_rabbitmq_messages_total",
            "The total number of incoming RabbitMQ messages",
        ))?;
        let success = IntCounter::with_opts(Opts::new(
            "emails_success_incoming_rabbitmq_messages_total",
            "The total number of successfully processed RabbitMQ messages",
        ))?;
        let error = IntCounter::with_opts(Opts::new(
            "emails_error_incoming_rabbitmq_messages_total",
            "The total number of rejected RabbitMQ messages",
        ))?;

        registry.register(Box::new(incoming.clone()))?;
        registry.register(Box::new(success.clone()))?;
        registry.register(Box::new(error.clone()))?;

        Ok(Self {
            incoming,
            success,
            error,
        })
    }

    pub fn record_incoming(&self) {
        self.incoming.inc();
    }

    pub fn record_success(&self) {
        self.success.inc();
    }

    pub fn record_error(&self) {
        self.error.inc();
    }

    pub fn incoming(&self) -> u64 {
        self.incoming.get()
    }

    pub fn success(&self) -> u64 {
        self.success.get()
    }

    pub fn error(&self) -> u64 {
        self.error.get()
    }
}
