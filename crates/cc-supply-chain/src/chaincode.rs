//! [`Chaincode`] implementation for supply chain tracking.

use crate::commands::SupplyChainCommand;
use crate::service;
use cc_shim::{Chaincode, ChaincodeStub, Response};

#[derive(Debug, Default, Clone, Copy)]
pub struct SupplyChain;

impl SupplyChain {
    async fn execute(&self, stub: &ChaincodeStub, command: SupplyChainCommand) -> Response {
        use SupplyChainCommand as C;
        match command {
            C::CreateProduct(new) => service::create_product(stub, new).await.into(),
            C::UpdateProduct {
                id,
                status,
                metadata,
            } => service::update_product(stub, &id, &status, &metadata)
                .await
                .into(),
            C::GetProduct(id) => service::get_product(stub, &id).await.into(),
            C::ListProducts { category } => {
                service::list_products(stub, category.as_deref()).await.into()
            }
            C::CreateShipment(new) => service::create_shipment(stub, new).await.into(),
            C::UpdateShipmentStatus {
                id,
                status,
                location,
            } => service::update_shipment_status(stub, &id, &status, &location)
                .await
                .into(),
            C::DeliverShipment { id, recipient } => {
                service::deliver_shipment(stub, &id, &recipient).await.into()
            }
            C::GetShipment(id) => service::get_shipment(stub, &id).await.into(),
            C::TrackShipment(tracking_id) => {
                service::track_shipment(stub, &tracking_id).await.into()
            }
            C::RecordTransaction(new) => service::record_transaction(stub, new).await.into(),
            C::GetTransaction(id) => service::get_transaction(stub, &id).await.into(),
            C::GetProductTransactions(product_id) => {
                service::get_product_transactions(stub, &product_id)
                    .await
                    .into()
            }
            C::RecordProvenance(new) => service::record_provenance(stub, new).await.into(),
            C::VerifyProvenance {
                product_id,
                provenance_id,
                verifier,
            } => service::verify_provenance(stub, &product_id, &provenance_id, &verifier)
                .await
                .into(),
            C::GetProductProvenance(product_id) => {
                service::get_product_provenance(stub, &product_id)
                    .await
                    .into()
            }
            C::TraceProduct(product_id) => service::trace_product(stub, &product_id).await.into(),
        }
    }
}

#[async_trait::async_trait]
impl Chaincode for SupplyChain {
    fn name(&self) -> &'static str {
        "supply-chain"
    }

    async fn init(&self, stub: &ChaincodeStub) -> Response {
        service::initialize(stub).await.into()
    }

    async fn invoke(&self, stub: &ChaincodeStub) -> Response {
        let (function, args) = stub.get_function_and_parameters();
        match SupplyChainCommand::parse(function, args) {
            Ok(command) => self.execute(stub, command).await,
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_shim::{ErrorKind, LedgerHarness};
    use serde_json::Value;

    async fn with_product() -> (LedgerHarness, SupplyChain) {
        let harness = LedgerHarness::default();
        let cc = SupplyChain;
        assert!(harness.init(&cc, &[]).await.is_success());
        let created = harness
            .invoke(
                &cc,
                "createProduct",
                &["p1", "Widget", "Blue widget", "SKU-1", "acme", "tools"],
            )
            .await;
        assert!(created.is_success(), "{:?}", created.response);
        (harness, cc)
    }

    fn actions(provenance: &Value) -> Vec<String> {
        provenance
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["action"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_ship_and_deliver_trace() {
        let (harness, cc) = with_product().await;
        harness
            .invoke(
                &cc,
                "createShipment",
                &["s1", "p1", "Berlin", "Paris", "dhl", "TRK-1"],
            )
            .await;
        let delivered = harness
            .invoke(&cc, "deliverShipment", &["s1", "store-9"])
            .await;
        assert_eq!(delivered.json()["status"], "delivered");

        let trace = harness.invoke(&cc, "traceProduct", &["p1"]).await.json();
        assert_eq!(actions(&trace["provenance"]), vec!["CREATE", "SHIP", "DELIVER"]);
        assert_eq!(trace["shipments"][0]["id"], "s1");
        assert_eq!(trace["product"]["id"], "p1");
        assert!(trace["generatedAt"].as_i64().is_some());

        let events = harness.ledger().events();
        assert_eq!(events.last().unwrap().name, service::SHIPMENT_DELIVERED_EVENT);
    }

    #[tokio::test]
    async fn test_delivered_shipment_is_final() {
        let (harness, cc) = with_product().await;
        harness
            .invoke(&cc, "createShipment", &["s1", "p1", "A", "B", "ups", "TRK-1"])
            .await;
        harness.invoke(&cc, "deliverShipment", &["s1", "me"]).await;
        let again = harness.invoke(&cc, "deliverShipment", &["s1", "me"]).await;
        assert_eq!(again.response.kind, Some(ErrorKind::FailedPrecondition));
        let update = harness
            .invoke(&cc, "updateShipmentStatus", &["s1", "lost", "B"])
            .await;
        assert_eq!(update.response.kind, Some(ErrorKind::FailedPrecondition));
    }

    #[tokio::test]
    async fn test_shipment_requires_product_and_unique_tracking() {
        let (harness, cc) = with_product().await;
        let orphan = harness
            .invoke(&cc, "createShipment", &["s0", "ghost", "A", "B", "ups", "TRK-0"])
            .await;
        assert_eq!(orphan.response.kind, Some(ErrorKind::NotFound));

        harness
            .invoke(&cc, "createShipment", &["s1", "p1", "A", "B", "ups", "TRK-1"])
            .await;
        let reused = harness
            .invoke(&cc, "createShipment", &["s2", "p1", "A", "B", "ups", "TRK-1"])
            .await;
        assert_eq!(reused.response.kind, Some(ErrorKind::AlreadyExists));

        let tracked = harness.invoke(&cc, "trackShipment", &["TRK-1"]).await;
        assert_eq!(tracked.json()["id"], "s1");
        let missing = harness.invoke(&cc, "trackShipment", &["TRK-9"]).await;
        assert_eq!(missing.response.kind, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_tracking_updates_append_provenance() {
        let (harness, cc) = with_product().await;
        harness
            .invoke(&cc, "createShipment", &["s1", "p1", "A", "B", "ups", "TRK-1"])
            .await;
        let updated = harness
            .invoke(&cc, "updateShipmentStatus", &["s1", "customs", "Dover"])
            .await;
        assert_eq!(updated.json()["metadata"]["lastLocation"], "Dover");

        let history = harness
            .invoke(&cc, "getProductProvenance", &["p1"])
            .await
            .json();
        assert_eq!(actions(&history), vec!["CREATE", "SHIP", "TRACK"]);
        assert_eq!(history[2]["location"], "Dover");
    }

    #[tokio::test]
    async fn test_verify_appends_instead_of_rewriting() {
        let (harness, cc) = with_product().await;
        let history = harness
            .invoke(&cc, "getProductProvenance", &["p1"])
            .await
            .json();
        let created_id = history[0]["id"].as_str().unwrap().to_string();

        let verify = harness
            .invoke(&cc, "verifyProvenance", &["p1", created_id.as_str(), "auditor"])
            .await;
        assert!(verify.is_success(), "{:?}", verify.response);
        assert_eq!(verify.json()["action"], "VERIFY");
        assert_eq!(verify.json()["evidence"]["verifiedRecord"], created_id.as_str());

        let history = harness
            .invoke(&cc, "getProductProvenance", &["p1"])
            .await
            .json();
        assert_eq!(actions(&history), vec!["CREATE", "VERIFY"]);
        assert_eq!(history[0]["verified"], true);
        assert_eq!(history[1]["verified"], false);

        let unknown = harness
            .invoke(&cc, "verifyProvenance", &["p1", "nope", "auditor"])
            .await;
        assert_eq!(unknown.response.kind, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_transactions_by_product() {
        let (harness, cc) = with_product().await;
        harness
            .invoke(&cc, "createProduct", &["p2", "Gadget", "", "SKU-2", "acme"])
            .await;
        harness
            .invoke(
                &cc,
                "recordTransaction",
                &["t1", "p1", "sale", "acme", "shop", "completed", "99.5", "EUR"],
            )
            .await;
        harness
            .invoke(
                &cc,
                "recordTransaction",
                &["t2", "p2", "transfer", "acme", "shop", "pending"],
            )
            .await;

        let p1 = harness
            .invoke(&cc, "getProductTransactions", &["p1"])
            .await
            .json();
        assert_eq!(p1.as_array().unwrap().len(), 1);
        assert_eq!(p1[0]["amount"], 99.5);
        assert_eq!(p1[0]["txHash"], "tx-000004");

        let trace = harness.invoke(&cc, "traceProduct", &["p2"]).await.json();
        assert_eq!(trace["transactions"][0]["id"], "t2");
        assert!(trace["transactions"][0].get("amount").is_none());
    }

    #[tokio::test]
    async fn test_update_and_list_products() {
        let (harness, cc) = with_product().await;
        harness
            .invoke(&cc, "createProduct", &["p2", "Gadget", "", "SKU-2", "acme", "toys"])
            .await;
        let updated = harness
            .invoke(&cc, "updateProduct", &["p1", "recalled", "lot", "42"])
            .await;
        assert_eq!(updated.json()["status"], "recalled");
        assert_eq!(updated.json()["metadata"]["lot"], "42");

        let tools = harness.invoke(&cc, "listProducts", &["tools"]).await.json();
        assert_eq!(tools.as_array().unwrap().len(), 1);
        let all = harness.invoke(&cc, "listProducts", &[]).await.json();
        assert_eq!(all.as_array().unwrap().len(), 2);

        let duplicate = harness
            .invoke(&cc, "createProduct", &["p1", "X", "", "S", "m"])
            .await;
        assert_eq!(duplicate.response.kind, Some(ErrorKind::AlreadyExists));
    }
}
