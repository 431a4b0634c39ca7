//! # Ports Layer
//!
//! - `inbound.rs` - Driving port implemented by chaincode
//! - `outbound.rs` - Driven port implemented by ledger transports

pub mod inbound;
pub mod outbound;

pub use inbound::Chaincode;
pub use outbound::{methods, CompositeKeyQuery, LedgerTransport, LogLevel, RangeQuery};
