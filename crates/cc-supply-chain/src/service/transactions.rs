use super::products::load_product;
use super::{now, Result};
use crate::commands::NewTransaction;
use crate::domain::{keys, Metadata, SupplyTransaction};
use cc_shim::{ChaincodeError, ChaincodeStub};

pub async fn record_transaction(
    stub: &ChaincodeStub,
    new: NewTransaction,
) -> Result<SupplyTransaction> {
    load_product(stub, &new.product_id).await?;
    let key = keys::transaction(&new.id)?;
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists("Transaction", &new.id));
    }

    let transaction = SupplyTransaction {
        id: new.id,
        product_id: new.product_id,
        transaction_type: new.transaction_type,
        from: new.from,
        to: new.to,
        timestamp: now(stub).await?,
        amount: new.amount,
        currency: new.currency,
        status: new.status,
        metadata: Metadata::new(),
        tx_hash: stub.get_tx_id().await?.to_string(),
    };
    stub.put_state_json(&key, &transaction).await?;
    stub.put_state(
        &keys::transaction_by_product(&transaction.product_id, &transaction.id)?,
        &[],
    )
    .await?;
    tracing::debug!(transaction = %transaction.id, product = %transaction.product_id, "Transaction recorded");
    Ok(transaction)
}

pub async fn get_transaction(stub: &ChaincodeStub, id: &str) -> Result<SupplyTransaction> {
    stub.get_state_json(&keys::transaction(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Transaction", id))
}

pub async fn get_product_transactions(
    stub: &ChaincodeStub,
    product_id: &str,
) -> Result<Vec<SupplyTransaction>> {
    Ok(stub
        .get_indexed_json(keys::TRANSACTION_BY_PRODUCT, &[product_id], keys::TRANSACTION)
        .await?)
}
