//! Per-call request logging and metrics for the gRPC server.

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use futures_util::FutureExt;
use herald_metrics::RpcMetrics;
use tower::{Layer, Service};
use tracing::{Instrument, Span};

#[derive(Clone, Debug)]
pub struct GrpcLoggingConfig {
    /// Path prefixes that are neither logged nor counted
    pub ignored_paths: Vec<String>,
}

impl Default for GrpcLoggingConfig {
    fn default() -> Self {
        Self {
            ignored_paths: vec!["/grpc.reflection.".to_string(), "/grpc.health.".to_string()],
        }
    }
}

impl GrpcLoggingConfig {
    fn should_ignore(&self, path: &str) -> bool {
        self.ignored_paths
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

/// Logs path, gRPC status and latency of every call, and records them in
/// [`RpcMetrics`] when given. A handler that panics is answered with
/// `INTERNAL` and the connection keeps serving.
#[derive(Clone)]
pub struct GrpcLoggingLayer {
    config: GrpcLoggingConfig,
    metrics: Option<RpcMetrics>,
}

impl GrpcLoggingLayer {
    pub const fn new(config: GrpcLoggingConfig, metrics: Option<RpcMetrics>) -> Self {
        Self { config, metrics }
    }
}

impl<S> Layer<S> for GrpcLoggingLayer {
    type Service = GrpcLoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        GrpcLoggingService {
            inner: service,
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GrpcLoggingService<S> {
    inner: S,
    config: GrpcLoggingConfig,
    metrics: Option<RpcMetrics>,
}

/// The status a handler returned. Errors are sent in the headers of a
/// trailers-only response; successful calls carry it in the trailers, so a
/// missing header means `OK`.
fn grpc_status<B>(response: &http::Response<B>) -> i32 {
    response
        .headers()
        .get("grpc-status")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

const GRPC_INTERNAL: i32 = 13;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Trailers-only `INTERNAL` response standing in for a panicked handler.
fn internal_response<B: Default>() -> http::Response<B> {
    let mut response = http::Response::new(B::default());
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/grpc"),
    );
    headers.insert("grpc-status", http::HeaderValue::from(GRPC_INTERNAL));
    headers.insert("grpc-message", http::HeaderValue::from_static("internal error"));
    response
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for GrpcLoggingService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Error: std::fmt::Display,
    S::Future: Send + 'static,
    ResBody: Default,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: http::Request<ReqBody>) -> Self::Future {
        let path = request.uri().path().to_string();
        let method = request.method().to_string();
        let ignore = self.config.should_ignore(&path);
        let metrics = self.metrics.clone();
        let start = Instant::now();
        let future = self.inner.call(request);

        let span = Span::current();

        Box::pin(
            async move {
                let result = match AssertUnwindSafe(future).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => {
                        tracing::error!(
                            path = %path,
                            panic = panic_message(payload.as_ref()),
                            "Handler panicked"
                        );
                        Ok(internal_response())
                    }
                };
                if ignore {
                    return result;
                }

                let elapsed = start.elapsed();
                let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                match &result {
                    Ok(response) => {
                        let status = grpc_status(response);
                        if let Some(metrics) = &metrics {
                            metrics.observe(status, &method, &path, elapsed);
                        }

                        tracing::info!(
                            path = %path,
                            grpc_status = status,
                            duration_ms = millis,
                            "{path} - {millis}ms - gRPC status: {status}"
                        );
                    }
                    Err(err) => {
                        tracing::error!(
                            path = %path,
                            duration_ms = millis,
                            error = %err,
                            "{path} - {millis}ms - ERROR: {err}"
                        );
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
