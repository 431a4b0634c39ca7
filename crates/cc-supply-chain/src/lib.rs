//! # Supply Chain Chaincode
//!
//! Products, shipments and commercial transactions with a per-product
//! provenance history. Every lifecycle step appends a provenance record
//! (`CREATE`, `UPDATE`, `SHIP`, `TRACK`, `DELIVER`); verification appends a
//! `VERIFY` record rather than editing history. `traceProduct` assembles the
//! full picture for one product.

pub mod chaincode;
pub mod commands;
pub mod domain;
pub mod service;

pub use chaincode::SupplyChain;
pub use commands::SupplyChainCommand;
pub use domain::{Product, ProvenanceRecord, Shipment, SupplyTransaction, Trace};
