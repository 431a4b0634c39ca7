//! Ledger key layout.
//!
//! Provenance is keyed `provenance \0 <productId> \0 <recordId>`, so a
//! product's history is one prefix scan and record ids sort by time.

use cc_shim::{create_composite_key, ShimResult};

pub const PRODUCT: &str = "product";
pub const PRODUCT_BY_CATEGORY: &str = "product~category";
pub const SHIPMENT: &str = "shipment";
pub const SHIPMENT_BY_PRODUCT: &str = "shipment~product";
pub const SHIPMENT_BY_TRACKING: &str = "shipment~tracking";
pub const TRANSACTION: &str = "transaction";
pub const TRANSACTION_BY_PRODUCT: &str = "transaction~product";
pub const PROVENANCE: &str = "provenance";

pub const SYSTEM_CONFIG: &str = "config:system";

pub fn product(id: &str) -> ShimResult<String> {
    create_composite_key(PRODUCT, &[id])
}

pub fn product_by_category(category: &str, id: &str) -> ShimResult<String> {
    create_composite_key(PRODUCT_BY_CATEGORY, &[category, id])
}

pub fn shipment(id: &str) -> ShimResult<String> {
    create_composite_key(SHIPMENT, &[id])
}

pub fn shipment_by_product(product_id: &str, id: &str) -> ShimResult<String> {
    create_composite_key(SHIPMENT_BY_PRODUCT, &[product_id, id])
}

pub fn shipment_by_tracking(tracking_id: &str, id: &str) -> ShimResult<String> {
    create_composite_key(SHIPMENT_BY_TRACKING, &[tracking_id, id])
}

pub fn transaction(id: &str) -> ShimResult<String> {
    create_composite_key(TRANSACTION, &[id])
}

pub fn transaction_by_product(product_id: &str, id: &str) -> ShimResult<String> {
    create_composite_key(TRANSACTION_BY_PRODUCT, &[product_id, id])
}

pub fn provenance(product_id: &str, record_id: &str) -> ShimResult<String> {
    create_composite_key(PROVENANCE, &[product_id, record_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_key_groups_by_product() {
        let key = provenance("p1", "00000000000000000001-tx-0").unwrap();
        assert!(key.starts_with("provenance\u{0}p1\u{0}"));
    }
}
