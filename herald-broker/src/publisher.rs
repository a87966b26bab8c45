use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_common::{internal, outgoing};
use herald_metrics::PublisherMetrics;
use lapin::{BasicProperties, Channel};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{BrokerConnection, BrokerError, Topology};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// Hands serialized messages to the broker.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, payload: &[u8], content_type: &str) -> Result<(), BrokerError>;
}

/// Publishes to the configured exchange on a dedicated channel.
///
/// No publisher confirms are requested: `Ok` means the message was handed to
/// the client library, not that the broker stored or routed it.
pub struct Publisher {
    channel: Arc<Mutex<Channel>>,
    exchange: String,
    routing_key: String,
    metrics: PublisherMetrics,
}

impl Publisher {
    /// Opens a channel and declares `topology` on it.
    pub async fn new(
        connection: &BrokerConnection,
        topology: &Topology,
        metrics: PublisherMetrics,
    ) -> Result<Self, BrokerError> {
        let channel = connection.create_channel().await?;
        topology.declare(&channel).await?;

        internal!(level = INFO, exchange = %topology.exchange, "Publisher ready");

        Ok(Self {
            channel: Arc::new(Mutex::new(channel)),
            exchange: topology.exchange.clone(),
            routing_key: topology.binding_key.clone(),
            metrics,
        })
    }

    /// Persistent delivery, a fresh message id and the send time in seconds.
    pub fn properties(
        content_type: &str,
        message_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> BasicProperties {
        BasicProperties::default()
            .with_content_type(content_type.into())
            .with_delivery_mode(PERSISTENT)
            .with_message_id(message_id.to_string().into())
            .with_timestamp(u64::try_from(sent_at.timestamp()).unwrap_or_default())
    }

    pub async fn close(&self) -> Result<(), BrokerError> {
        let channel = self.channel.lock().await;
        if !channel.status().connected() {
            return Ok(());
        }

        channel
            .close(200, "publisher closed")
            .await
            .map_err(BrokerError::Channel)?;

        internal!(level = INFO, "Publisher channel closed");
        Ok(())
    }
}

#[async_trait]
impl MessagePublisher for Publisher {
    async fn publish(&self, payload: &[u8], content_type: &str) -> Result<(), BrokerError> {
        let message_id = Uuid::new_v4();
        let properties = Self::properties(content_type, message_id, Utc::now());

        let channel = self.channel.lock().await;
        let _confirm = channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                Topology::publish_options(),
                payload,
                properties,
            )
            .await
            .map_err(|source| BrokerError::Publish {
                exchange: self.exchange.clone(),
                source,
            })?;
        drop(channel);

        self.metrics.record_published();
        outgoing!(
            level = DEBUG,
            %message_id,
            exchange = %self.exchange,
            routing_key = %self.routing_key,
            len = payload.len(),
            "Published message"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn properties_mark_messages_persistent() {
        let id = Uuid::new_v4();
        let sent_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid date");

        let properties = Publisher::properties("application/json", id, sent_at);

        assert_eq!(*properties.delivery_mode(), Some(PERSISTENT));
        assert_eq!(
            properties.message_id().as_ref().map(|id| id.as_str().to_string()),
            Some(id.to_string())
        );
        assert_eq!(
            properties.content_type().as_ref().map(|ct| ct.as_str().to_string()),
            Some("application/json".to_string())
        );
        assert_eq!(*properties.timestamp(), Some(1_714_564_800));
    }

    #[test]
    fn pre_epoch_timestamp_clamps_to_zero() {
        let sent_at = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).single().expect("valid date");
        let properties = Publisher::properties("text/plain", Uuid::nil(), sent_at);
        assert_eq!(*properties.timestamp(), Some(0));
    }
}
