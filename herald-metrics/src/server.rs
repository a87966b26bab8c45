//! Prometheus scrape endpoint

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use herald_common::internal;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

use crate::{MetricsConfig, MetricsError, MetricsRegistry};

/// Serves the registry in the text exposition format on the configured path.
pub struct MetricsServer {
    listener: TcpListener,
    router: Router,
}

impl MetricsServer {
    /// Binds the listener straight away so a port clash is reported during
    /// startup rather than once the service is running.
    pub async fn bind(
        config: &MetricsConfig,
        registry: MetricsRegistry,
    ) -> Result<Self, MetricsError> {
        if !config.path.starts_with('/') {
            return Err(MetricsError::InvalidPath(config.path.clone()));
        }

        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|source| MetricsError::Bind {
                address: config.listen_address.clone(),
                source,
            })?;

        tracing::info!(
            address = %config.listen_address,
            path = %config.path,
            "Metrics server bound successfully"
        );

        let router = Router::new()
            .route(&config.path, get(metrics_handler))
            .with_state(registry)
            .layer(TimeoutLayer::new(Duration::from_secs(5)));

        Ok(Self { listener, router })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `token` is cancelled.
    pub async fn serve(self, token: CancellationToken) -> Result<(), MetricsError> {
        internal!(level = INFO, "Metrics server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                token.cancelled().await;
                internal!(level = INFO, "Metrics server received shutdown signal");
            })
            .await
            .map_err(MetricsError::Server)?;

        internal!(level = INFO, "Metrics server stopped");
        Ok(())
    }
}

async fn metrics_handler(State(registry): State<MetricsRegistry>) -> Response {
    match registry.gather() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, registry.content_type())],
            body,
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
