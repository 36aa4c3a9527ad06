//! # Error Types
//!
//! The error taxonomy for the fabric monitor. Each variant maps to one
//! failure boundary: connection setup, a single query or page fetch, a
//! malformed event payload, or a payload that is not valid text.
//!
//! Propagation policy: `ConnectionError` is fatal at startup; `QueryError`
//! is reported to the operator and the session returns to the menu;
//! `MalformedPayloadError` and `EncodingError` are logged per-event and the
//! offending event is dropped without disturbing the subscription.

use thiserror::Error;

/// Failure to reach the bus fabric. Fatal at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The broker did not accept the connection.
    #[error("Broker unreachable: {0}")]
    Unreachable(String),

    /// An operation was attempted on a gateway that is not connected.
    #[error("Not connected to the fabric")]
    NotConnected,

    /// `connect` was called twice on the same gateway.
    #[error("Already connected to the fabric")]
    AlreadyConnected,
}

/// A single query or page request failed. Reported, never fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The remote service rejected or failed the request.
    #[error("Service '{service}' failed operation '{operation}': {message}")]
    ServiceFailure {
        service: String,
        operation: String,
        message: String,
    },

    /// No service is registered under the requested id.
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// The response document did not have the expected shape.
    #[error("Malformed response from '{service}': {reason}")]
    MalformedResponse { service: String, reason: String },

    /// A page was requested outside the known result window.
    #[error("Offset {offset} out of range: result count is {result_count}")]
    OffsetOutOfRange { offset: usize, result_count: usize },

    /// A page was requested with a zero page size.
    #[error("Page size must be greater than zero")]
    ZeroPageSize,

    /// A condition tree failed validation before it was sent.
    #[error("Invalid condition tree: {0}")]
    InvalidCondition(String),
}

impl QueryError {
    /// Shorthand for a malformed-response error.
    pub fn malformed(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// A reputation-change payload is missing expected structure.
///
/// The variants name exactly what was absent so an operator can tell a
/// schema drift from a truncated payload.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedPayloadError {
    /// A nested key was absent along a fixed extraction path.
    #[error("Missing key '{segment}' at path {path:?}")]
    MissingKey { path: Vec<String>, segment: String },

    /// A value along the path was not the expected JSON type.
    #[error("Unexpected type at path {path:?}: expected {expected}")]
    UnexpectedType { path: Vec<String>, expected: &'static str },

    /// A reputation array is shorter than a contract-defined slot index.
    #[error("Array '{array}' has {len} entries, provider slot {index} absent")]
    IndexOutOfRange {
        array: &'static str,
        index: usize,
        len: usize,
    },

    /// A content hash was not the expected fixed-length hex string.
    #[error("Hash '{field}' is not a {expected_len}-char hex string")]
    InvalidHash {
        field: &'static str,
        expected_len: usize,
    },

    /// The payload bytes were not a JSON document at all.
    #[error("Payload is not valid JSON: {0}")]
    NotJson(String),
}

/// A telemetry payload is not valid UTF-8 text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Payload on topic '{topic}' is not valid UTF-8 (byte offset {valid_up_to})")]
pub struct EncodingError {
    /// The topic the payload arrived on.
    pub topic: String,
    /// How many bytes decoded cleanly before the failure.
    pub valid_up_to: usize,
}

/// Menu input outside the known selection set. Re-prompt, not an exception.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown option selected: '{0}'")]
pub struct UnknownSelection(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_display() {
        let err = QueryError::OffsetOutOfRange {
            offset: 40,
            result_count: 35,
        };
        assert_eq!(
            err.to_string(),
            "Offset 40 out of range: result count is 35"
        );
    }

    #[test]
    fn test_malformed_payload_display() {
        let err = MalformedPayloadError::MissingKey {
            path: vec!["hashes".into(), "sha1".into()],
            segment: "sha1".into(),
        };
        assert!(err.to_string().contains("sha1"));
    }

    #[test]
    fn test_index_out_of_range_names_slot() {
        let err = MalformedPayloadError::IndexOutOfRange {
            array: "newReputations",
            index: 5,
            len: 2,
        };
        assert!(err.to_string().contains("newReputations"));
        assert!(err.to_string().contains('5'));
    }
}
