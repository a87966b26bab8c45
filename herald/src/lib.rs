//! The herald email dispatch service.
//!
//! [`Herald`] is the configuration root. [`Herald::run`] wires the broker,
//! store, mailer and both network listeners together and hands them to a
//! [`Supervisor`] that owns the process lifecycle.

use std::{sync::Arc, time::Duration};

use herald_broker::{BrokerConnection, ConsumerPool, Publisher};
use herald_common::{internal, logging};
use herald_dispatch::EmailUseCase;
use herald_metrics::{MetricsRegistry, MetricsServer};
use herald_rpc::{EmailServiceHandler, RpcServer};

mod config;
pub mod supervisor;

pub use config::{CONFIG_ENV, Herald, find_config_file};
pub use supervisor::{State, Supervisor, SupervisorError};

impl Herald {
    /// Run herald until it is signalled or one of its services stops.
    ///
    /// # Errors
    ///
    /// Fails before serving anything if the broker, store, mailer or either
    /// listener cannot be set up. Afterwards, returns the error of the first
    /// service to stop.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();
        internal!(level = INFO, "Herald starting");

        let registry = MetricsRegistry::new(&self.metrics.namespace)?;
        let metrics_server = MetricsServer::bind(&self.metrics, registry.clone()).await?;

        let connection = BrokerConnection::connect(&self.broker.uri).await?;
        let publisher = Arc::new(
            Publisher::new(
                &connection,
                &self.broker.topology(),
                registry.publisher().clone(),
            )
            .await?,
        );

        let repository = herald_store::connect(&self.store).await?;
        let mailer = herald_dispatch::mailer::from_config(&self.mailer)?;

        let usecase = Arc::new(EmailUseCase::new(
            self.mailer.sender.clone(),
            mailer,
            repository,
            publisher.clone(),
        ));

        let pool = ConsumerPool::new(
            connection.clone(),
            &self.broker,
            usecase.clone(),
            registry.consumer().clone(),
        );

        let enqueue = self.rpc.enqueue_send_requests;
        let rpc_server = RpcServer::bind(
            self.rpc,
            EmailServiceHandler::new(usecase, enqueue),
            Some(registry.rpc().clone()),
        )
        .await?;

        let result = Supervisor::new(
            Duration::from_secs(self.shutdown_grace_secs),
            Duration::from_secs(self.closer_timeout_secs),
        )
        .with_signals()
        .service("metrics", move |token| async move {
            anyhow::Ok(metrics_server.serve(token).await?)
        })
        .service("consumer", move |token| async move {
            anyhow::Ok(pool.start(token).await?)
        })
        .service("rpc", move |token| async move {
            anyhow::Ok(rpc_server.serve(token).await?)
        })
        .closer("publisher", move || async move {
            anyhow::Ok(publisher.close().await?)
        })
        .closer("broker", move || async move {
            anyhow::Ok(connection.close().await?)
        })
        .run()
        .await;

        internal!(level = INFO, "Herald stopped");

        Ok(result?)
    }
}
