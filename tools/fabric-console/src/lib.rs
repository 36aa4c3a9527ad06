//! # Fabric Console
//!
//! Interactive monitor & search console for the security-telemetry fabric:
//! live event subscriptions, reputation-change banners, and one-shot
//! searches against the host-response and endpoint-management services.
//!
//! The binary in `main.rs` owns the terminal; everything dispatchable lives
//! in `session` so integration tests can drive the same paths against an
//! in-memory fabric. `demo` seeds that fabric with synthetic services.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod demo;
pub mod interrupt;
pub mod session;

pub use interrupt::InterruptListener;
pub use session::{MenuOption, Session, SessionState};
