pub mod entities;
pub mod keys;

pub use entities::{
    actions, shipment_status, Metadata, Product, ProvenanceRecord, Shipment, SupplyChainConfig,
    SupplyTransaction, Trace,
};
