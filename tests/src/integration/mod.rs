//! Cross-crate integration tests.
//!
//! - `scenarios` drives chaincode through `LedgerHarness` (no network).
//! - `transport` runs the dispatcher over `JsonRpcTransport` against a dev
//!   node bound to an ephemeral port.

pub mod scenarios;
pub mod transport;
