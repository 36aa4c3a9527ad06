//! # Bus Gateway Traits
//!
//! The seam between this tool and the fabric transport. Components hold an
//! `Arc<dyn BusGateway>` and never see connection handshakes, broker
//! discovery, or wire framing.

use async_trait::async_trait;
use fabric_types::{ConnectionError, QueryError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A registered per-topic event handler.
///
/// Invoked on the fabric's delivery task, concurrently with the foreground
/// thread. `handle` is infallible by signature: implementations contain
/// their own failures (log and drop) so one bad payload never reaches the
/// delivery machinery.
pub trait EventHandler: Send + Sync {
    /// React to one event on a subscribed topic.
    fn handle(&self, topic: &str, payload: &[u8]);
}

/// Error a remote service returns for a failed operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Service error {code}: {message}")]
pub struct ServiceError {
    /// Service-specific error code.
    pub code: i32,
    /// Human-readable description.
    pub message: String,
}

impl ServiceError {
    /// Build a service error.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Server side of the request/response protocol, for in-process fabrics.
///
/// Real deployments answer requests inside the remote services; tests and
/// demo mode register these on the `InMemoryFabric`.
pub trait ServiceHandler: Send + Sync {
    /// Execute one operation with JSON parameters.
    fn invoke(&self, operation: &str, params: &Value) -> Result<Value, ServiceError>;
}

impl<F> ServiceHandler for F
where
    F: Fn(&str, &Value) -> Result<Value, ServiceError> + Send + Sync,
{
    fn invoke(&self, operation: &str, params: &Value) -> Result<Value, ServiceError> {
        self(operation, params)
    }
}

/// Opaque interface to the publish/subscribe fabric.
#[async_trait]
pub trait BusGateway: Send + Sync {
    /// Connect to the fabric. Must be called exactly once, before any other
    /// operation.
    async fn connect(&self) -> Result<(), ConnectionError>;

    /// Release the connection. Idempotent: repeated calls are no-ops.
    async fn disconnect(&self);

    /// Register a handler for a topic. Delivery for a single topic is in
    /// receive order; no ordering holds across topics.
    fn subscribe_event(
        &self,
        topic: &str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), ConnectionError>;

    /// Publish a request to a service and await the correlated response.
    async fn request(
        &self,
        service: &str,
        operation: &str,
        params: Value,
    ) -> Result<Value, QueryError>;
}
