use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Failed to connect to broker: {0}")]
    Connection(#[source] lapin::Error),

    #[error("Failed to declare {entity} `{name}`: {source}")]
    Topology {
        entity: &'static str,
        name: String,
        #[source]
        source: lapin::Error,
    },

    #[error("Channel error: {0}")]
    Channel(#[source] lapin::Error),

    /// The delivery stream ended or failed. Terminal for the consumer pool.
    #[error("Delivery stream closed: {0}")]
    StreamClosed(String),

    #[error("Failed to publish to `{exchange}`: {source}")]
    Publish {
        exchange: String,
        #[source]
        source: lapin::Error,
    },

    #[error("Failed to settle delivery {tag}: {reason}")]
    Acknowledge { tag: u64, reason: String },
}

impl BrokerError {
    pub const fn is_stream_closed(&self) -> bool {
        matches!(self, Self::StreamClosed(_))
    }
}
