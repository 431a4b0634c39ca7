use super::provenance::evidence;
use super::{append_provenance, now, Result, PRODUCT_CREATED_EVENT};
use crate::commands::NewProduct;
use crate::domain::entities::PRODUCT_CREATED_STATUS;
use crate::domain::{actions, keys, Metadata, Product};
use cc_shim::{ChaincodeError, ChaincodeStub};
use serde_json::{json, Value};

pub(crate) async fn load_product(stub: &ChaincodeStub, id: &str) -> Result<Product> {
    stub.get_state_json(&keys::product(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Product", id))
}

pub async fn create_product(stub: &ChaincodeStub, new: NewProduct) -> Result<Product> {
    let key = keys::product(&new.id)?;
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists("Product", &new.id));
    }

    let product = Product {
        id: new.id,
        name: new.name,
        description: new.description,
        sku: new.sku,
        category: new.category.unwrap_or_default(),
        manufacturer: new.manufacturer,
        created_at: now(stub).await?,
        status: PRODUCT_CREATED_STATUS.to_string(),
        metadata: Metadata::new(),
    };
    stub.put_state_json(&key, &product).await?;
    if !product.category.is_empty() {
        stub.put_state(&keys::product_by_category(&product.category, &product.id)?, &[])
            .await?;
    }

    append_provenance(
        stub,
        &product.id,
        actions::CREATE,
        &product.manufacturer,
        "factory",
        evidence(json!({ "sku": product.sku, "name": product.name })),
    )
    .await?;
    stub.set_event_json(
        PRODUCT_CREATED_EVENT,
        &json!({
            "action": "product_created",
            "productID": product.id,
            "name": product.name,
            "manufacturer": product.manufacturer,
        }),
    )
    .await?;
    tracing::info!(product = %product.id, "Product created");
    Ok(product)
}

pub async fn update_product(
    stub: &ChaincodeStub,
    id: &str,
    status: &str,
    metadata: &[(String, String)],
) -> Result<Product> {
    let mut product = load_product(stub, id).await?;
    product.status = status.to_string();
    for (key, value) in metadata {
        product
            .metadata
            .insert(key.clone(), Value::String(value.clone()));
    }
    stub.put_state_json(&keys::product(id)?, &product).await?;

    append_provenance(
        stub,
        id,
        actions::UPDATE,
        "system",
        "network",
        evidence(json!({ "status": status, "metadata": product.metadata })),
    )
    .await?;
    Ok(product)
}

pub async fn get_product(stub: &ChaincodeStub, id: &str) -> Result<Product> {
    load_product(stub, id).await
}

pub async fn list_products(stub: &ChaincodeStub, category: Option<&str>) -> Result<Vec<Product>> {
    Ok(match category {
        Some(category) => {
            stub.get_indexed_json(keys::PRODUCT_BY_CATEGORY, &[category], keys::PRODUCT)
                .await?
        }
        None => stub.get_composite_json::<_, &str>(keys::PRODUCT, &[]).await?,
    })
}
