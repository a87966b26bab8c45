use herald_common::internal;
use herald_metrics::RpcMetrics;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Server, server::TcpIncoming};

use crate::{
    EmailServiceHandler, GrpcLoggingConfig, GrpcLoggingLayer, RpcConfig, RpcError,
    proto::EmailServiceServer,
};

/// The gRPC server, bound but not yet serving.
pub struct RpcServer {
    listener: TcpListener,
    config: RpcConfig,
    handler: EmailServiceHandler,
    metrics: Option<RpcMetrics>,
}

impl RpcServer {
    pub async fn bind(
        config: RpcConfig,
        handler: EmailServiceHandler,
        metrics: Option<RpcMetrics>,
    ) -> Result<Self, RpcError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|source| RpcError::Bind {
                address: config.listen_address.clone(),
                source,
            })?;

        tracing::info!(address = %config.listen_address, "RPC server bound successfully");

        Ok(Self {
            listener,
            config,
            handler,
            metrics,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `token` is cancelled, then stops accepting connections and
    /// waits for in-flight calls to finish.
    pub async fn serve(self, token: CancellationToken) -> Result<(), RpcError> {
        let incoming =
            TcpIncoming::from_listener(self.listener, true, Some(self.config.tcp_keepalive()))
                .map_err(|err| RpcError::Listener(err.to_string()))?;

        internal!(level = INFO, "RPC server starting");

        Server::builder()
            .http2_keepalive_interval(Some(self.config.keepalive_interval()))
            .http2_keepalive_timeout(Some(self.config.keepalive_timeout()))
            .timeout(self.config.request_timeout())
            .layer(GrpcLoggingLayer::new(
                GrpcLoggingConfig::default(),
                self.metrics,
            ))
            .add_service(EmailServiceServer::new(self.handler))
            .serve_with_incoming_shutdown(incoming, async move {
                token.cancelled().await;
                internal!(level = INFO, "RPC server received shutdown signal");
            })
            .await?;

        internal!(level = INFO, "RPC server stopped");
        Ok(())
    }
}
