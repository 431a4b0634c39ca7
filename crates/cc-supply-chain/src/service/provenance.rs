use super::products::load_product;
use super::shipments::product_shipments;
use super::transactions::get_product_transactions;
use super::{now, Result};
use crate::commands::NewProvenance;
use crate::domain::{actions, keys, Metadata, ProvenanceRecord, Trace};
use cc_shim::{ChaincodeError, ChaincodeStub};
use serde_json::{json, Value};
use std::collections::BTreeSet;

/// Evidence map from a `json!` object literal.
pub(crate) fn evidence(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Metadata::new(),
    }
}

/// Append one provenance record for `product_id`. Records are never
/// rewritten.
pub async fn append_provenance(
    stub: &ChaincodeStub,
    product_id: &str,
    action: &str,
    actor: &str,
    location: &str,
    evidence: Metadata,
) -> Result<ProvenanceRecord> {
    let record = ProvenanceRecord {
        id: stub.unique_record_id().await?,
        product_id: product_id.to_string(),
        action: action.to_string(),
        actor: actor.to_string(),
        location: location.to_string(),
        timestamp: now(stub).await?,
        evidence,
        verified: false,
        tx_hash: stub.get_tx_id().await?.to_string(),
    };
    stub.put_state_json(&keys::provenance(product_id, &record.id)?, &record)
        .await?;
    tracing::trace!(product = product_id, action, record = %record.id, "Provenance appended");
    Ok(record)
}

pub async fn record_provenance(stub: &ChaincodeStub, new: NewProvenance) -> Result<ProvenanceRecord> {
    load_product(stub, &new.product_id).await?;
    append_provenance(
        stub,
        &new.product_id,
        &new.action,
        &new.actor,
        &new.location,
        new.evidence,
    )
    .await
}

/// Appends a `VERIFY` record referencing `provenance_id` instead of
/// modifying the verified record.
pub async fn verify_provenance(
    stub: &ChaincodeStub,
    product_id: &str,
    provenance_id: &str,
    verifier: &str,
) -> Result<ProvenanceRecord> {
    let target: ProvenanceRecord = stub
        .get_state_json(&keys::provenance(product_id, provenance_id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Provenance record", provenance_id))?;

    append_provenance(
        stub,
        product_id,
        actions::VERIFY,
        verifier,
        &target.location,
        evidence(json!({
            "verifiedRecord": target.id,
            "verifiedAction": target.action,
        })),
    )
    .await
}

/// History ordered by (timestamp, id), with `verified` set on every record
/// some `VERIFY` entry points at.
pub async fn get_product_provenance(
    stub: &ChaincodeStub,
    product_id: &str,
) -> Result<Vec<ProvenanceRecord>> {
    let mut records: Vec<ProvenanceRecord> = stub
        .get_composite_json(keys::PROVENANCE, &[product_id])
        .await?;

    let verified: BTreeSet<String> = records
        .iter()
        .filter_map(ProvenanceRecord::verifies)
        .map(str::to_string)
        .collect();
    for record in &mut records {
        record.verified = verified.contains(&record.id);
    }
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
    Ok(records)
}

pub async fn trace_product(stub: &ChaincodeStub, product_id: &str) -> Result<Trace> {
    let product = load_product(stub, product_id).await?;
    Ok(Trace {
        product,
        provenance: get_product_provenance(stub, product_id).await?,
        shipments: product_shipments(stub, product_id).await?,
        transactions: get_product_transactions(stub, product_id).await?,
        generated_at: now(stub).await?,
    })
}
