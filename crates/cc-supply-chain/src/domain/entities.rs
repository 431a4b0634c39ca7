//! Supply chain records. Timestamps are Unix seconds from the transaction
//! timestamp.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type Metadata = BTreeMap<String, Value>;

/// Provenance actions written by the chaincode itself. Callers of
/// `recordProvenance` may use any other action name.
pub mod actions {
    pub const CREATE: &str = "CREATE";
    pub const UPDATE: &str = "UPDATE";
    pub const SHIP: &str = "SHIP";
    pub const TRACK: &str = "TRACK";
    pub const DELIVER: &str = "DELIVER";
    pub const VERIFY: &str = "VERIFY";
}

pub mod shipment_status {
    pub const IN_TRANSIT: &str = "in_transit";
    pub const DELIVERED: &str = "delivered";
}

pub const PRODUCT_CREATED_STATUS: &str = "created";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sku: String,
    #[serde(default)]
    pub category: String,
    pub manufacturer: String,
    pub created_at: i64,
    pub status: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    #[serde(rename = "productID")]
    pub product_id: String,
    pub from_location: String,
    pub to_location: String,
    pub carrier: String,
    #[serde(rename = "trackingID")]
    pub tracking_id: String,
    pub status: String,
    pub shipped_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<i64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Shipment {
    pub fn is_delivered(&self) -> bool {
        self.status == shipment_status::DELIVERED
    }
}

/// A commercial transaction about a product (sale, transfer, payment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyTransaction {
    pub id: String,
    #[serde(rename = "productID")]
    pub product_id: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub status: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Ledger transaction that recorded this entry.
    pub tx_hash: String,
}

/// Append-only. `verified` is never stored as true: it is derived when
/// reading, from `VERIFY` records that reference this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceRecord {
    pub id: String,
    #[serde(rename = "productID")]
    pub product_id: String,
    pub action: String,
    pub actor: String,
    pub location: String,
    pub timestamp: i64,
    #[serde(default)]
    pub evidence: Metadata,
    #[serde(default)]
    pub verified: bool,
    pub tx_hash: String,
}

impl ProvenanceRecord {
    /// Id of the record a `VERIFY` entry vouches for.
    pub fn verifies(&self) -> Option<&str> {
        if self.action != actions::VERIFY {
            return None;
        }
        self.evidence.get("verifiedRecord").and_then(Value::as_str)
    }
}

/// Full history of one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub product: Product,
    pub provenance: Vec<ProvenanceRecord>,
    pub shipments: Vec<Shipment>,
    pub transactions: Vec<SupplyTransaction>,
    pub generated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChainConfig {
    pub version: String,
    pub max_products: u64,
    pub max_shipments: u64,
    pub provenance_enabled: bool,
    pub automatic_verification: bool,
    pub supported_currencies: Vec<String>,
}

impl Default for SupplyChainConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            max_products: 10_000,
            max_shipments: 50_000,
            provenance_enabled: true,
            automatic_verification: false,
            supported_currencies: ["USD", "EUR", "GBP", "JPY"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}
