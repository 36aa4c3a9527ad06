//! # Free-Text Query Client
//!
//! One-shot `system.find` against the endpoint-management service. The text
//! goes out verbatim in a single request field; matching happens remotely.
//! The client only serializes, deserializes, and renders.

use fabric_bus::topics::SERVICE_ENDPOINT_MGMT;
use fabric_bus::BusGateway;
use fabric_types::{QueryError, QueryRequest};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Client for the endpoint-management free-text find.
///
/// Holds no per-query state: two searches with the same text are two
/// independent requests and two independently parsed documents.
pub struct TextQueryClient {
    gateway: Arc<dyn BusGateway>,
    instance_id: String,
}

impl TextQueryClient {
    /// Create a client bound to one endpoint-management service instance.
    #[must_use]
    pub fn new(gateway: Arc<dyn BusGateway>, instance_id: impl Into<String>) -> Self {
        Self {
            gateway,
            instance_id: instance_id.into(),
        }
    }

    /// Run `system.find` with the given text, verbatim.
    pub async fn text_search(&self, text: &str) -> Result<Value, QueryError> {
        debug!(instance = %self.instance_id, "Running free-text find");
        let (operation, params) = QueryRequest::new("system.find")
            .with_param("instanceId", self.instance_id.as_str())
            .with_param("searchText", text)
            .into_wire();
        self.gateway
            .request(SERVICE_ENDPOINT_MGMT, &operation, params)
            .await
    }

    /// Render a result document with stable key ordering and 4-space
    /// indentation, suitable for snapshot comparison.
    pub fn render_pretty(document: &Value) -> Result<String, QueryError> {
        // serde_json maps are BTreeMap-backed here (preserve_order is off),
        // so key order is already deterministic.
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        document
            .serialize(&mut serializer)
            .map_err(|e| QueryError::malformed(SERVICE_ENDPOINT_MGMT, e.to_string()))?;
        String::from_utf8(out)
            .map_err(|e| QueryError::malformed(SERVICE_ENDPOINT_MGMT, e.to_string()))
    }
}
