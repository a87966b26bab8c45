use std::{collections::HashMap, future::Future, pin::Pin, time::Duration};

use herald_common::internal;
use thiserror::Error;
use tokio::{
    sync::watch,
    task::{Id, JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;

pub type BoxFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

type Service = Box<dyn FnOnce(CancellationToken) -> BoxFuture + Send>;
type Closer = Box<dyn FnOnce() -> BoxFuture + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// What made the supervisor drain.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Service `{name}` failed: {source}")]
    Service {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Service `{0}` exited unexpectedly")]
    ServiceExited(String),

    #[error("Service `{0}` panicked")]
    Panicked(String),
}

impl SupervisorError {
    /// Name of the service that triggered the shutdown
    pub fn service(&self) -> &str {
        match self {
            Self::Service { name, .. } | Self::ServiceExited(name) | Self::Panicked(name) => name,
        }
    }

    pub const fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked(_))
    }
}

/// Runs a set of long-lived services until one of them stops, the process is
/// signalled, or [`Supervisor::token`] is cancelled.
///
/// Every service receives a child of the supervisor's token. Once draining
/// starts, services get `grace` to unwind before being aborted; closers then
/// run in registration order, each bounded by `closer_timeout`.
pub struct Supervisor {
    services: Vec<(String, Service)>,
    closers: Vec<(String, Closer)>,
    grace: Duration,
    closer_timeout: Duration,
    signals: bool,
    token: CancellationToken,
    state: watch::Sender<State>,
}

impl Supervisor {
    pub fn new(grace: Duration, closer_timeout: Duration) -> Self {
        let (state, _) = watch::channel(State::Starting);

        Self {
            services: Vec::new(),
            closers: Vec::new(),
            grace,
            closer_timeout,
            signals: false,
            token: CancellationToken::new(),
            state,
        }
    }

    /// Drain on SIGINT or SIGTERM.
    #[must_use]
    pub fn with_signals(mut self) -> Self {
        self.signals = true;
        self
    }

    #[must_use]
    pub fn service<F, Fut>(mut self, name: impl Into<String>, service: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.services
            .push((name.into(), Box::new(move |token| Box::pin(service(token)))));
        self
    }

    #[must_use]
    pub fn closer<F, Fut>(mut self, name: impl Into<String>, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers
            .push((name.into(), Box::new(move || Box::pin(closer()))));
        self
    }

    /// Cancelling this token drains the supervisor without an error.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Returns the error that triggered the drain, or `Ok(())` when shutdown
    /// was requested by a signal or through the token.
    pub async fn run(self) -> Result<(), SupervisorError> {
        let Self {
            services,
            closers,
            grace,
            closer_timeout,
            signals,
            token,
            state,
        } = self;

        let mut tasks = JoinSet::new();
        let mut names = HashMap::new();

        for (name, service) in services {
            internal!(level = INFO, service = %name, "Starting service");
            let handle = tasks.spawn(service(token.child_token()));
            names.insert(handle.id(), name);
        }

        state.send_replace(State::Running);

        let trigger = if tasks.is_empty() {
            None
        } else {
            let signal = async {
                if signals {
                    termination_signal().await;
                } else {
                    std::future::pending::<()>().await;
                }
            };

            tokio::select! {
                () = signal => None,
                () = token.cancelled() => {
                    internal!(level = INFO, "Shutdown requested");
                    None
                }
                Some(joined) = tasks.join_next_with_id() => Some(trigger_error(&names, joined)),
            }
        };

        if let Some(err) = &trigger {
            tracing::error!(
                service = err.service(),
                error = %err,
                "Service stopped, shutting down"
            );
        }

        state.send_replace(State::Draining);
        token.cancel();
        internal!(level = INFO, remaining = tasks.len(), "Draining services");

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next_with_id().await {
                log_drained(&names, joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                "Grace period elapsed, aborting remaining services"
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }

        for (name, closer) in closers {
            match tokio::time::timeout(closer_timeout, closer()).await {
                Ok(Ok(())) => internal!(closer = %name, "Closed"),
                Ok(Err(err)) => tracing::warn!(closer = %name, error = %err, "Closer failed"),
                Err(_) => tracing::warn!(closer = %name, "Closer timed out"),
            }
        }

        state.send_replace(State::Stopped);
        internal!(level = INFO, "Shutdown complete");

        trigger.map_or(Ok(()), Err)
    }
}

fn name_of(names: &HashMap<Id, String>, id: Id) -> String {
    names.get(&id).cloned().unwrap_or_else(|| id.to_string())
}

fn trigger_error(
    names: &HashMap<Id, String>,
    joined: Result<(Id, anyhow::Result<()>), JoinError>,
) -> SupervisorError {
    match joined {
        Ok((id, Ok(()))) => SupervisorError::ServiceExited(name_of(names, id)),
        Ok((id, Err(err))) => SupervisorError::Service {
            name: name_of(names, id),
            source: err.into(),
        },
        Err(err) if err.is_panic() => SupervisorError::Panicked(name_of(names, err.id())),
        Err(err) => SupervisorError::ServiceExited(name_of(names, err.id())),
    }
}

fn log_drained(names: &HashMap<Id, String>, joined: Result<(Id, anyhow::Result<()>), JoinError>) {
    match joined {
        Ok((id, Ok(()))) => {
            internal!(level = INFO, service = %name_of(names, id), "Service stopped");
        }
        Ok((id, Err(err))) => {
            tracing::warn!(
                service = %name_of(names, id),
                error = %err,
                "Service failed while draining"
            );
        }
        Err(err) => {
            tracing::error!(
                service = %name_of(names, err.id()),
                error = %err,
                "Service did not stop cleanly"
            );
        }
    }
}

async fn termination_signal() {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Unable to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = interrupt => internal!(level = INFO, "CTRL+C entered, shutting down"),
        () = terminate => internal!(level = INFO, "Terminate signal received, shutting down"),
    }
}
