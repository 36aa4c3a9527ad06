//! # Fabric Events - Normalization Layer
//!
//! Turns raw payload bytes from the fabric into the stable records in
//! `fabric-types`, independent of the wire schema:
//!
//! - reputation-change notifications from the threat-intelligence service
//!   (hash extraction plus per-provider trust level pairs)
//! - generic telemetry events (strict UTF-8 decode)
//!
//! Both paths are stateless transforms. The `EventHandler` implementations
//! here contain their own failures: a malformed or undecodable payload is
//! logged and dropped, and the subscription keeps running.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod handlers;
pub mod normalize;

// Re-export main types
pub use handlers::{OutputSink, ReputationChangeHandler, TelemetryHandler};
pub use normalize::{decode_reputation_change, normalize_reputation_change, normalize_telemetry};
