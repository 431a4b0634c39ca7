//! # Adapters
//!
//! - `json_rpc` - production transport over HTTP
//! - `memory` - in-memory ledger with transaction overlay

pub mod json_rpc;
pub mod memory;

pub use json_rpc::{wire, JsonRpcError, JsonRpcTransport};
pub use memory::{ChaincodeEvent, CommitSummary, InMemoryLedger, LogRecord, TransactionSpec};
