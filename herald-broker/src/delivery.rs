//! A single message taken off the queue, and the seams used to settle it.

use async_trait::async_trait;
use lapin::options::{BasicAckOptions, BasicRejectOptions};

use crate::BrokerError;

/// Settles deliveries with the broker.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Acknowledge this delivery only, never cumulatively.
    async fn ack(&self, tag: u64) -> Result<(), BrokerError>;

    /// Reject without requeue. The broker drops the message.
    async fn reject(&self, tag: u64) -> Result<(), BrokerError>;
}

#[async_trait]
impl Acknowledger for lapin::acker::Acker {
    async fn ack(&self, tag: u64) -> Result<(), BrokerError> {
        lapin::acker::Acker::ack(self, BasicAckOptions { multiple: false })
            .await
            .map(|_| ())
            .map_err(|err| BrokerError::Acknowledge {
                tag,
                reason: err.to_string(),
            })
    }

    async fn reject(&self, tag: u64) -> Result<(), BrokerError> {
        lapin::acker::Acker::reject(self, BasicRejectOptions { requeue: false })
            .await
            .map(|_| ())
            .map_err(|err| BrokerError::Acknowledge {
                tag,
                reason: err.to_string(),
            })
    }
}

/// An opaque payload with exactly one terminal action.
///
/// [`Delivery::ack`] and [`Delivery::reject`] consume the delivery, so it
/// cannot be settled twice.
pub struct Delivery {
    tag: u64,
    payload: Vec<u8>,
    acker: Box<dyn Acknowledger>,
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("tag", &self.tag)
            .field("len", &self.payload.len())
            .finish_non_exhaustive()
    }
}

impl Delivery {
    pub fn new(tag: u64, payload: Vec<u8>, acker: Box<dyn Acknowledger>) -> Self {
        Self {
            tag,
            payload,
            acker,
        }
    }

    pub const fn tag(&self) -> u64 {
        self.tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub async fn ack(self) -> Result<(), BrokerError> {
        self.acker.ack(self.tag).await
    }

    pub async fn reject(self) -> Result<(), BrokerError> {
        self.acker.reject(self.tag).await
    }
}

impl From<lapin::message::Delivery> for Delivery {
    fn from(delivery: lapin::message::Delivery) -> Self {
        Self::new(
            delivery.delivery_tag,
            delivery.data,
            Box::new(delivery.acker),
        )
    }
}

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Processes one delivery payload. `Ok` acknowledges the delivery, any error
/// rejects it.
#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> Result<(), HandlerError>;
}
