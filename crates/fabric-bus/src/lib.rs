//! # Fabric Bus - Gateway Boundary
//!
//! The opaque interface between this tool and the publish/subscribe fabric.
//! The rest of the workspace depends only on four operations:
//!
//! - `connect()` / `disconnect()` - one connection per session
//! - `subscribe_event(topic, handler)` - per-topic event delivery
//! - `request(service, operation, params)` - correlated request/response
//!
//! The real wire protocol, broker discovery, and authentication all live
//! behind this boundary in the vendor transport. `InMemoryFabric` is the
//! in-process implementation used by tests and the console's demo mode.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod gateway;
pub mod memory;
pub mod topics;

// Re-export main types
pub use gateway::{BusGateway, EventHandler, ServiceError, ServiceHandler};
pub use memory::InMemoryFabric;

/// Maximum events to buffer in the delivery queue before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
