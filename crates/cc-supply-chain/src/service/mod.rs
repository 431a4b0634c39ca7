//! Supply chain operations, grouped by record type.

mod products;
mod provenance;
mod shipments;
mod transactions;

pub use products::{create_product, get_product, list_products, update_product};
pub use provenance::{
    append_provenance, get_product_provenance, record_provenance, trace_product,
    verify_provenance,
};
pub use shipments::{
    create_shipment, deliver_shipment, get_shipment, track_shipment, update_shipment_status,
};
pub use transactions::{get_product_transactions, get_transaction, record_transaction};

use crate::domain::{keys, SupplyChainConfig};
use cc_shim::{ChaincodeError, ChaincodeStub};

pub(crate) type Result<T> = std::result::Result<T, ChaincodeError>;

pub const PRODUCT_CREATED_EVENT: &str = "ProductCreated";
pub const SHIPMENT_CREATED_EVENT: &str = "ShipmentCreated";
pub const SHIPMENT_DELIVERED_EVENT: &str = "ShipmentDelivered";

pub(crate) async fn now(stub: &ChaincodeStub) -> Result<i64> {
    Ok(stub.get_tx_timestamp().await?.timestamp())
}

pub async fn initialize(stub: &ChaincodeStub) -> Result<SupplyChainConfig> {
    let config = SupplyChainConfig::default();
    stub.put_state_json(keys::SYSTEM_CONFIG, &config).await?;
    tracing::info!(version = %config.version, "Supply chain initialised");
    Ok(config)
}
