use std::sync::Arc;

use herald_common::internal;
use lapin::{Channel, Connection, ConnectionProperties};

use crate::BrokerError;

/// The process-wide broker connection. Cloning shares the same connection.
#[derive(Clone)]
pub struct BrokerConnection {
    inner: Arc<Connection>,
}

impl std::fmt::Debug for BrokerConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConnection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl BrokerConnection {
    pub async fn connect(uri: &str) -> Result<Self, BrokerError> {
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(BrokerError::Connection)?;

        connection.on_error(|err| {
            tracing::error!(error = %err, "Broker connection lost");
        });

        internal!(level = INFO, "Connected to broker");

        Ok(Self {
            inner: Arc::new(connection),
        })
    }

    /// Opens a new channel. Channels are not shared between the consumer pool
    /// and the publisher.
    pub async fn create_channel(&self) -> Result<Channel, BrokerError> {
        self.inner
            .create_channel()
            .await
            .map_err(BrokerError::Channel)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.status().connected()
    }

    pub async fn close(&self) -> Result<(), BrokerError> {
        if !self.is_connected() {
            return Ok(());
        }

        self.inner
            .close(200, "herald shutting down")
            .await
            .map_err(BrokerError::Connection)?;

        internal!(level = INFO, "Broker connection closed");
        Ok(())
    }
}
