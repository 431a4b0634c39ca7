//! # Chaincode Shim
//!
//! The execution contract between an off-process chaincode and the node that
//! maintains the ledger. Chaincode never touches storage; every read, write,
//! scan, event and context lookup is one RPC made through a
//! [`ChaincodeStub`] bound to a single transaction.
//!
//! ## Invocation Flow
//!
//! ```text
//! node spawns process ──→ dispatcher::start
//!                              │  ShimConfig::from_env, argv
//!                              ↓
//!                         ChaincodeStub ──RPC──→ node ledger service
//!                              │
//!                 Chaincode::init / Chaincode::invoke
//!                              │
//!                              ↓
//!                   Response ──→ stdout summary + exit code
//! ```
//!
//! Exit code 0 is the only signal that lets the node commit the writes.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Composite keys, iterator, response, context, argument checks
//! - `ports/` - `LedgerTransport` (driven) and `Chaincode` (driving)
//! - `adapters/` - `JsonRpcTransport`, `InMemoryLedger`
//! - `stub.rs` - The per-invocation RPC proxy
//! - `dispatcher.rs` - Lifecycle and process entry point
//! - `harness.rs` - In-process transaction driver for tests
//!
//! ## Usage
//!
//! ```ignore
//! use cc_shim::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::process::ExitCode {
//!     cc_shim::start(MyChaincode::default()).await
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod harness;
pub mod ports;
pub mod stub;

pub use adapters::{InMemoryLedger, JsonRpcTransport};
pub use config::ShimConfig;
pub use dispatcher::{run_invocation, start, LifecycleState};
pub use domain::{
    create_composite_key, split_composite_key, Invocation, InvocationMode, KeyValue, QueryPage,
    Response, StateQueryIterator, TransactionContext,
};
pub use errors::{ChaincodeError, ErrorKind, ShimError, ShimResult};
pub use harness::{LedgerHarness, Outcome};
pub use ports::{Chaincode, LedgerTransport, LogLevel};
pub use stub::ChaincodeStub;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a chaincode crate usually needs.
pub mod prelude {
    pub use crate::domain::args;
    pub use crate::domain::{status, Invocation, KeyValue, Response};
    pub use crate::errors::{ChaincodeError, ErrorKind, ShimError};
    pub use crate::ports::{Chaincode, LogLevel};
    pub use crate::stub::ChaincodeStub;
}
