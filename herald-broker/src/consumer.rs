//! The consumer pool.
//!
//! A fixed number of workers share one delivery stream. Each delivery is handed
//! to exactly one worker, processed, then acknowledged on success or rejected
//! without requeue on failure. Order is only preserved with a single worker.

use std::{
    pin::Pin,
    sync::{Arc, OnceLock},
};

use futures_util::{Stream, StreamExt, stream::Fuse};
use herald_common::{incoming, internal};
use herald_metrics::ConsumerMetrics;
use lapin::types::FieldTable;
use tokio::{sync::Mutex, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{BrokerConfig, BrokerConnection, BrokerError, Delivery, DeliveryHandler, Topology};

pub type DeliveryStream = Pin<Box<dyn Stream<Item = Result<Delivery, BrokerError>> + Send>>;

type SharedStream = Arc<Mutex<Fuse<DeliveryStream>>>;

pub struct ConsumerPool {
    connection: BrokerConnection,
    topology: Topology,
    worker_count: usize,
    handler: Arc<dyn DeliveryHandler>,
    metrics: ConsumerMetrics,
}

impl ConsumerPool {
    pub fn new(
        connection: BrokerConnection,
        config: &BrokerConfig,
        handler: Arc<dyn DeliveryHandler>,
        metrics: ConsumerMetrics,
    ) -> Self {
        Self {
            connection,
            topology: config.topology(),
            worker_count: config.worker_pool_size.max(1),
            handler,
            metrics,
        }
    }

    /// Consume until `token` is cancelled or the delivery stream closes.
    ///
    /// Setup failures are returned before any worker starts. Cancellation
    /// returns `Ok(())`; a closed stream returns [`BrokerError::StreamClosed`].
    pub async fn start(self, token: CancellationToken) -> Result<(), BrokerError> {
        let channel = self.connection.create_channel().await?;
        self.topology.declare(&channel).await?;

        let consumer = channel
            .basic_consume(
                &self.topology.queue,
                &self.topology.consumer_tag,
                Topology::consume_options(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| BrokerError::Topology {
                entity: "consumer",
                name: self.topology.consumer_tag.clone(),
                source,
            })?;

        internal!(
            level = INFO,
            queue = %self.topology.queue,
            consumer_tag = %self.topology.consumer_tag,
            workers = self.worker_count,
            "Consumer pool started"
        );

        let stream: DeliveryStream = Box::pin(consumer.map(|delivery| {
            delivery
                .map(Delivery::from)
                .map_err(BrokerError::Channel)
        }));

        let result = run_workers(
            stream,
            self.worker_count,
            self.handler,
            self.metrics,
            token,
        )
        .await;

        if channel.status().connected() {
            if let Err(err) = channel.close(200, "consumer pool stopped").await {
                tracing::warn!(error = %err, "Failed to close consumer channel");
            }
        }

        internal!(level = INFO, "Consumer pool stopped");
        result
    }
}

/// Runs `worker_count` workers over `stream` until it ends or `token` fires.
///
/// Workers finish settling the delivery they hold before exiting. The first
/// stream error or end of stream stops every worker and is returned as
/// [`BrokerError::StreamClosed`].
pub async fn run_workers(
    stream: DeliveryStream,
    worker_count: usize,
    handler: Arc<dyn DeliveryHandler>,
    metrics: ConsumerMetrics,
    token: CancellationToken,
) -> Result<(), BrokerError> {
    let stream: SharedStream = Arc::new(Mutex::new(stream.fuse()));
    let stop = token.child_token();
    let closed = Arc::new(OnceLock::new());

    let mut workers = JoinSet::new();
    for id in 0..worker_count.max(1) {
        workers.spawn(worker(
            id,
            Arc::clone(&stream),
            Arc::clone(&handler),
            metrics.clone(),
            stop.clone(),
            Arc::clone(&closed),
        ));
    }

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "Consumer worker panicked");
            let _ = closed.set(format!("worker panicked: {err}"));
            stop.cancel();
        }
    }

    closed
        .get()
        .map_or(Ok(()), |reason| Err(BrokerError::StreamClosed(reason.clone())))
}

async fn worker(
    id: usize,
    stream: SharedStream,
    handler: Arc<dyn DeliveryHandler>,
    metrics: ConsumerMetrics,
    stop: CancellationToken,
    closed: Arc<OnceLock<String>>,
) {
    internal!(worker = id, "Worker started");

    loop {
        let next = tokio::select! {
            biased;
            () = stop.cancelled() => break,
            next = async { stream.lock().await.next().await } => next,
        };

        match next {
            Some(Ok(delivery)) => settle(id, delivery, handler.as_ref(), &metrics).await,
            Some(Err(err)) => {
                tracing::error!(worker = id, error = %err, "Delivery stream failed");
                let _ = closed.set(err.to_string());
                stop.cancel();
                break;
            }
            None => {
                tracing::warn!(worker = id, "Delivery stream ended");
                let _ = closed.set("delivery stream ended".to_string());
                stop.cancel();
                break;
            }
        }
    }

    internal!(worker = id, "Worker stopped");
}

async fn settle(
    worker: usize,
    delivery: Delivery,
    handler: &dyn DeliveryHandler,
    metrics: &ConsumerMetrics,
) {
    let tag = delivery.tag();
    metrics.record_incoming();
    incoming!(worker, tag, len = delivery.payload().len(), "Received delivery");

    match handler.handle(delivery.payload()).await {
        Ok(()) => match delivery.ack().await {
            Ok(()) => {
                metrics.record_success();
                incoming!(level = DEBUG, worker, tag, "Delivery acknowledged");
            }
            Err(err) => {
                metrics.record_error();
                tracing::error!(worker, tag, error = %err, "Failed to acknowledge delivery");
            }
        },
        Err(cause) => {
            metrics.record_error();
            incoming!(level = DEBUG, worker, tag, error = %cause, "Rejecting delivery");
            if let Err(err) = delivery.reject().await {
                tracing::error!(worker, tag, error = %err, "Failed to reject delivery");
            }
        }
    }
}
