//! # Fabric Query - Remote Search Clients
//!
//! Thin, typed clients over `BusGateway::request`:
//!
//! - `PagedQueryClient` drives the host-response service's two-step search
//!   protocol: create a search (result count fixed at creation), then pull
//!   fixed-size windows with sort parameters.
//! - `TextQueryClient` sends one free-text find to the endpoint-management
//!   service and renders the JSON result for display.
//!
//! Neither client retries: a failed request surfaces as a `QueryError` and
//! the caller decides whether to re-issue it.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod paged;
pub mod text;

// Re-export main types
pub use paged::{PagedQueryClient, ResultHandle};
pub use text::TextQueryClient;
