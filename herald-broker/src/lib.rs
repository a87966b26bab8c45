//! AMQP plumbing for herald.
//!
//! One [`BrokerConnection`] is shared by the process. The [`ConsumerPool`] and
//! the [`Publisher`] each open their own channel on it and declare the same
//! [`Topology`] before use.

mod config;
mod connection;
pub mod consumer;
pub mod delivery;
mod error;
mod publisher;
pub mod topology;

pub use config::BrokerConfig;
pub use connection::BrokerConnection;
pub use consumer::{ConsumerPool, DeliveryStream, run_workers};
pub use delivery::{Acknowledger, Delivery, DeliveryHandler, HandlerError};
pub use error::BrokerError;
pub use publisher::{MessagePublisher, Publisher};
pub use topology::Topology;
