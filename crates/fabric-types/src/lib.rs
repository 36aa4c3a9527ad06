//! # Fabric Types - Shared Data Model
//!
//! Strongly-typed records exchanged between the console, the query clients,
//! and the event normalizers. Nothing here touches the wire: the bus gateway
//! carries opaque `serde_json::Value` documents and raw payload bytes, and
//! these types are the stable views the rest of the workspace works with.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod access;
pub mod errors;
pub mod query;
pub mod reputation;
pub mod telemetry;

// Re-export main types
pub use access::json_path;
pub use errors::{
    ConnectionError, EncodingError, MalformedPayloadError, QueryError, UnknownSelection,
};
pub use query::{
    Condition, ConditionOp, ConditionTree, QueryRequest, ResultPage, SortDirection,
};
pub use reputation::{ProviderChange, ReputationChangeRecord, ReputationProvider};
pub use telemetry::TelemetryEvent;

/// Default page size for paged searches.
pub const DEFAULT_PAGE_SIZE: usize = 20;
