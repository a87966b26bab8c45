//! gRPC surface of herald.
//!
//! `SendEmails` validates (and optionally enqueues) a message; the two find
//! operations are read-only lookups over the audit store.

mod config;
mod error;
mod handler;
mod logging;
pub mod proto;
mod server;

pub use config::RpcConfig;
pub use error::{RpcError, processing_error_to_status, query_error_to_status};
pub use handler::EmailServiceHandler;
pub use logging::{GrpcLoggingConfig, GrpcLoggingLayer};
pub use server::RpcServer;
