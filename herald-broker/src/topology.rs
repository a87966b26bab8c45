//! Exchange, queue, binding and QoS declaration.
//!
//! The same descriptor is declared on every channel that uses it, so the
//! consumer and the publisher agree on durability and routing.

use herald_common::internal;
use lapin::{
    Channel, ExchangeKind,
    options::{
        BasicConsumeOptions, BasicPublishOptions, BasicQosOptions, ExchangeDeclareOptions,
        QueueBindOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};

use crate::BrokerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: String,
    pub queue: String,
    pub binding_key: String,
    pub consumer_tag: String,
    pub prefetch_count: u16,
}

impl Topology {
    /// Durable, direct, not auto-deleted and not internal.
    pub const fn exchange_options() -> ExchangeDeclareOptions {
        ExchangeDeclareOptions {
            passive: false,
            durable: true,
            auto_delete: false,
            internal: false,
            nowait: false,
        }
    }

    pub const fn exchange_kind() -> ExchangeKind {
        ExchangeKind::Direct
    }

    /// Durable, shared and not auto-deleted.
    pub const fn queue_options() -> QueueDeclareOptions {
        QueueDeclareOptions {
            passive: false,
            durable: true,
            exclusive: false,
            auto_delete: false,
            nowait: false,
        }
    }

    /// Prefetch applies per consumer, not to the whole channel.
    pub const fn qos_options() -> BasicQosOptions {
        BasicQosOptions { global: false }
    }

    /// Manual acknowledgement.
    pub const fn consume_options() -> BasicConsumeOptions {
        BasicConsumeOptions {
            no_local: false,
            no_ack: false,
            exclusive: false,
            nowait: false,
        }
    }

    pub const fn publish_options() -> BasicPublishOptions {
        BasicPublishOptions {
            mandatory: false,
            immediate: false,
        }
    }

    /// Declares the exchange and queue, binds them and applies QoS.
    ///
    /// A failure leaves the channel unusable; callers must not consume or
    /// publish on it.
    pub async fn declare(&self, channel: &Channel) -> Result<(), BrokerError> {
        channel
            .exchange_declare(
                &self.exchange,
                Self::exchange_kind(),
                Self::exchange_options(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| BrokerError::Topology {
                entity: "exchange",
                name: self.exchange.clone(),
                source,
            })?;

        internal!(level = INFO, exchange = %self.exchange, "Declared exchange");

        let queue = channel
            .queue_declare(&self.queue, Self::queue_options(), FieldTable::default())
            .await
            .map_err(|source| BrokerError::Topology {
                entity: "queue",
                name: self.queue.clone(),
                source,
            })?;

        internal!(
            level = INFO,
            queue = queue.name().as_str(),
            message_count = queue.message_count(),
            consumer_count = queue.consumer_count(),
            exchange = %self.exchange,
            binding_key = %self.binding_key,
            "Declared queue, binding it to exchange"
        );

        channel
            .queue_bind(
                &self.queue,
                &self.exchange,
                &self.binding_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| BrokerError::Topology {
                entity: "binding",
                name: self.binding_key.clone(),
                source,
            })?;

        channel
            .basic_qos(self.prefetch_count, Self::qos_options())
            .await
            .map_err(|source| BrokerError::Topology {
                entity: "qos",
                name: self.prefetch_count.to_string(),
                source,
            })?;

        internal!(
            level = INFO,
            queue = %self.queue,
            prefetch_count = self.prefetch_count,
            "Queue bound"
        );

        Ok(())
    }
}
