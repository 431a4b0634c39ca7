//! # Development Ledger Node
//!
//! Serves the chaincode shim's JSON-RPC surface over HTTP from an
//! [`InMemoryLedger`](cc_shim::InMemoryLedger), so chaincode binaries can be
//! run end to end without a real peer.
//!
//! ## Methods
//!
//! | Method | Purpose |
//! |--------|---------|
//! | `shim_*` | State access and transaction context, as called by `JsonRpcTransport` |
//! | `dev_beginTransaction` | Open a transaction (`transactionId?`, `creator?` hex, `timestampSeconds?`) |
//! | `dev_commit` | Apply the pending write set, returns the commit summary |
//! | `dev_rollback` | Discard the pending write set |
//! | `dev_events` | Events of every committed transaction |
//!
//! Ranges are start-inclusive and end-exclusive; an empty end key is
//! unbounded. Writes refused by the ledger come back as
//! `{"success": false, "error": ...}` results, not JSON-RPC errors.

pub mod config;
pub mod rpc;
pub mod server;

pub use config::DevNodeConfig;
pub use rpc::{dev_methods, dispatch, BeginTransactionParams};
pub use server::{DevNode, RunningNode};

use std::net::SocketAddr;
use thiserror::Error;

/// Dev node errors.
#[derive(Debug, Error)]
pub enum DevNodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(String),
}
