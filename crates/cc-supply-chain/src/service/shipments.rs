use super::products::load_product;
use super::provenance::evidence;
use super::{append_provenance, now, Result, SHIPMENT_CREATED_EVENT, SHIPMENT_DELIVERED_EVENT};
use crate::commands::NewShipment;
use crate::domain::{actions, keys, shipment_status, Metadata, Shipment};
use cc_shim::{ChaincodeError, ChaincodeStub};
use serde_json::{json, Value};

async fn load_shipment(stub: &ChaincodeStub, id: &str) -> Result<Shipment> {
    stub.get_state_json(&keys::shipment(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Shipment", id))
}

fn ensure_in_flight(shipment: &Shipment) -> Result<()> {
    if shipment.is_delivered() {
        return Err(ChaincodeError::failed_precondition(format!(
            "Shipment {} is already delivered",
            shipment.id
        )));
    }
    Ok(())
}

/// The product must exist; shipment and tracking ids must both be unused.
pub async fn create_shipment(stub: &ChaincodeStub, new: NewShipment) -> Result<Shipment> {
    load_product(stub, &new.product_id).await?;
    let key = keys::shipment(&new.id)?;
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists("Shipment", &new.id));
    }
    let tracked = stub
        .get_state_by_partial_composite_key(keys::SHIPMENT_BY_TRACKING, &[&new.tracking_id])
        .await?;
    if tracked.has_next() {
        return Err(ChaincodeError::already_exists("Tracking id", &new.tracking_id));
    }

    let shipment = Shipment {
        id: new.id,
        product_id: new.product_id,
        from_location: new.from,
        to_location: new.to,
        carrier: new.carrier,
        tracking_id: new.tracking_id,
        status: shipment_status::IN_TRANSIT.to_string(),
        shipped_at: now(stub).await?,
        delivered_at: None,
        metadata: Metadata::new(),
    };
    stub.put_state_json(&key, &shipment).await?;
    stub.put_state(&keys::shipment_by_product(&shipment.product_id, &shipment.id)?, &[])
        .await?;
    stub.put_state(&keys::shipment_by_tracking(&shipment.tracking_id, &shipment.id)?, &[])
        .await?;

    append_provenance(
        stub,
        &shipment.product_id,
        actions::SHIP,
        &shipment.carrier,
        &shipment.from_location,
        evidence(json!({
            "shipmentID": shipment.id,
            "trackingID": shipment.tracking_id,
            "destination": shipment.to_location,
        })),
    )
    .await?;
    stub.set_event_json(
        SHIPMENT_CREATED_EVENT,
        &json!({
            "action": "shipment_created",
            "shipmentID": shipment.id,
            "productID": shipment.product_id,
            "carrier": shipment.carrier,
            "trackingID": shipment.tracking_id,
        }),
    )
    .await?;
    tracing::info!(shipment = %shipment.id, product = %shipment.product_id, "Shipment created");
    Ok(shipment)
}

pub async fn update_shipment_status(
    stub: &ChaincodeStub,
    id: &str,
    status: &str,
    location: &str,
) -> Result<Shipment> {
    let mut shipment = load_shipment(stub, id).await?;
    ensure_in_flight(&shipment)?;
    let now = now(stub).await?;

    shipment.status = status.to_string();
    shipment
        .metadata
        .insert("lastLocation".to_string(), Value::from(location));
    shipment
        .metadata
        .insert("lastUpdate".to_string(), Value::from(now));
    stub.put_state_json(&keys::shipment(id)?, &shipment).await?;

    append_provenance(
        stub,
        &shipment.product_id,
        actions::TRACK,
        &shipment.carrier,
        location,
        evidence(json!({ "shipmentID": id, "status": status })),
    )
    .await?;
    Ok(shipment)
}

pub async fn deliver_shipment(stub: &ChaincodeStub, id: &str, recipient: &str) -> Result<Shipment> {
    let mut shipment = load_shipment(stub, id).await?;
    ensure_in_flight(&shipment)?;
    let delivered_at = now(stub).await?;

    shipment.status = shipment_status::DELIVERED.to_string();
    shipment.delivered_at = Some(delivered_at);
    shipment
        .metadata
        .insert("recipient".to_string(), Value::from(recipient));
    stub.put_state_json(&keys::shipment(id)?, &shipment).await?;

    append_provenance(
        stub,
        &shipment.product_id,
        actions::DELIVER,
        recipient,
        &shipment.to_location,
        evidence(json!({ "shipmentID": id, "deliveredAt": delivered_at })),
    )
    .await?;
    stub.set_event_json(
        SHIPMENT_DELIVERED_EVENT,
        &json!({
            "action": "shipment_delivered",
            "shipmentID": id,
            "productID": shipment.product_id,
            "recipient": recipient,
            "deliveredAt": delivered_at,
        }),
    )
    .await?;
    tracing::info!(shipment = id, recipient, "Shipment delivered");
    Ok(shipment)
}

pub async fn get_shipment(stub: &ChaincodeStub, id: &str) -> Result<Shipment> {
    load_shipment(stub, id).await
}

pub async fn track_shipment(stub: &ChaincodeStub, tracking_id: &str) -> Result<Shipment> {
    let shipments: Vec<Shipment> = stub
        .get_indexed_json(keys::SHIPMENT_BY_TRACKING, &[tracking_id], keys::SHIPMENT)
        .await?;
    shipments
        .into_iter()
        .next()
        .ok_or_else(|| ChaincodeError::not_found("Shipment with tracking id", tracking_id))
}

pub(crate) async fn product_shipments(stub: &ChaincodeStub, product_id: &str) -> Result<Vec<Shipment>> {
    Ok(stub
        .get_indexed_json(keys::SHIPMENT_BY_PRODUCT, &[product_id], keys::SHIPMENT)
        .await?)
}
