//! # End-to-End Scenarios over HTTP
//!
//! The dispatcher talks to a dev node through `JsonRpcTransport`; the test
//! opens and closes transactions with the node's `dev_*` methods, the way a
//! peer wraps a chaincode process.

use cc_devnode::{dev_methods, DevNode, DevNodeConfig, RunningNode};
use cc_shim::{run_invocation, Chaincode, Invocation, JsonRpcTransport, Response, ShimConfig};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 2024-01-01T00:00:00Z
pub const GENESIS_SECONDS: i64 = 1_704_067_200;

/// A dev node plus the client side a peer would run for each transaction.
pub struct RemoteLedger {
    node: RunningNode,
    client: reqwest::Client,
    config: ShimConfig,
    counter: AtomicI64,
}

impl RemoteLedger {
    pub async fn start(config: DevNodeConfig) -> Self {
        let node = match DevNode::new(config).spawn().await {
            Ok(node) => node,
            Err(e) => panic!("dev node failed to start: {e}"),
        };
        let config = ShimConfig {
            ledger_address: node.url(),
            ..ShimConfig::default()
        };
        Self {
            node,
            client: reqwest::Client::new(),
            config,
            counter: AtomicI64::new(0),
        }
    }

    pub fn node(&self) -> &RunningNode {
        &self.node
    }

    /// Call a node method and return its `result`, or the error object.
    pub async fn rpc(&self, method: &str, params: Value) -> Result<Value, Value> {
        let body = json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 });
        let response: Value = self
            .client
            .post(self.node.url())
            .json(&body)
            .send()
            .await
            .map_err(|e| json!({ "message": e.to_string() }))?
            .json()
            .await
            .map_err(|e| json!({ "message": e.to_string() }))?;
        match response.get("error") {
            Some(error) => Err(error.clone()),
            None => Ok(response["result"].clone()),
        }
    }

    /// Timestamp, in seconds, of the next transaction.
    pub fn next_timestamp(&self) -> i64 {
        GENESIS_SECONDS + self.counter.load(Ordering::SeqCst) + 1
    }

    /// Run one transaction: begin, invoke over HTTP, commit or roll back.
    pub async fn run<C: Chaincode>(&self, chaincode: &C, invocation: Invocation) -> Response {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let begin = self
            .rpc(
                dev_methods::BEGIN_TRANSACTION,
                json!({
                    "transactionId": format!("remote-{n:04}"),
                    "creator": "636c69656e74",
                    "timestampSeconds": GENESIS_SECONDS + n,
                }),
            )
            .await;
        assert!(begin.is_ok(), "begin failed: {begin:?}");

        let transport = Arc::new(JsonRpcTransport::new(
            &self.config.ledger_address,
            Duration::from_secs(5),
        ));
        let response = run_invocation(chaincode, transport, invocation, &self.config).await;

        let close = if response.is_success() {
            dev_methods::COMMIT
        } else {
            dev_methods::ROLLBACK
        };
        let closed = self.rpc(close, Value::Null).await;
        assert!(closed.is_ok(), "{close} failed: {closed:?}");
        response
    }

    pub async fn init<C: Chaincode>(&self, chaincode: &C) -> Response {
        self.run(chaincode, Invocation::init(Vec::new())).await
    }

    pub async fn invoke<C: Chaincode>(&self, chaincode: &C, function: &str, args: &[&str]) -> Response {
        self.run(chaincode, Invocation::invoke(function, args.iter().copied()))
            .await
    }

    /// Shut the node down.
    pub async fn stop(self) {
        if let Err(e) = self.node.stop().await {
            panic!("dev node did not stop cleanly: {e}");
        }
    }
}

/// Decode a response payload as JSON.
pub fn payload(response: &Response) -> Value {
    serde_json::from_slice(&response.payload).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_gateway_registry::GatewayRegistry;
    use cc_identity::domain::credential_digest;
    use cc_identity::IdentityVerification;
    use cc_shim::ErrorKind;
    use cc_supply_chain::SupplyChain;

    // =============================================================================
    // SCENARIOS OVER THE WIRE
    // =============================================================================

    #[tokio::test]
    async fn test_gateway_registration_over_http() {
        let ledger = RemoteLedger::start(DevNodeConfig::local()).await;
        let cc = GatewayRegistry;
        assert!(ledger.init(&cc).await.is_success());

        let registered = ledger
            .invoke(&cc, "registerGateway", &["gw001", "pk-1", "org1"])
            .await;
        assert!(registered.is_success(), "{registered:?}");

        let fetched = ledger.invoke(&cc, "getGateway", &["gw001"]).await;
        assert_eq!(payload(&fetched)["status"], "active");

        let duplicate = ledger
            .invoke(&cc, "registerGateway", &["gw001", "pk-2", "org2"])
            .await;
        assert_eq!(duplicate.kind, Some(ErrorKind::AlreadyExists));

        let events = ledger.rpc(dev_methods::EVENTS, Value::Null).await.unwrap();
        let names: Vec<&str> = events
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["GatewayRegistered"]);
        assert_eq!(events[0]["transactionId"], "remote-0002");

        ledger.stop().await;
    }

    #[tokio::test]
    async fn test_expired_credential_over_http() {
        let ledger = RemoteLedger::start(DevNodeConfig::local()).await;
        let cc = IdentityVerification;
        assert!(ledger.init(&cc).await.is_success());
        for (id, kind) in [("university", "university"), ("alice", "person")] {
            let created = ledger
                .invoke(&cc, "createIdentity", &[id, "pk", kind, "org1"])
                .await;
            assert!(created.is_success(), "{created:?}");
        }

        let proof = credential_digest(
            "cred001",
            "degree",
            "university",
            "alice",
            ledger.next_timestamp(),
        );
        let issued = ledger
            .invoke(
                &cc,
                "issueCredential",
                &["cred001", "degree", "university", "alice", "{}", proof.as_str(), "-1"],
            )
            .await;
        assert!(issued.is_success(), "{issued:?}");

        let verdict = payload(&ledger.invoke(&cc, "verifyCredential", &["cred001"]).await);
        assert_eq!(verdict["valid"], false);
        assert_eq!(verdict["reason"], "expired");

        ledger.stop().await;
    }

    #[tokio::test]
    async fn test_trace_over_http_with_small_pages() {
        let config = DevNodeConfig {
            max_page_size: 2,
            ..DevNodeConfig::local()
        };
        let ledger = RemoteLedger::start(config).await;
        let cc = SupplyChain;
        assert!(ledger.init(&cc).await.is_success());

        ledger
            .invoke(
                &cc,
                "createProduct",
                &["PROD001", "Tea", "Green", "SKU-T1", "estate", "food"],
            )
            .await;
        ledger
            .invoke(
                &cc,
                "createShipment",
                &["SHIP001", "PROD001", "Colombo", "Rotterdam", "msc", "TRK-9"],
            )
            .await;
        ledger
            .invoke(&cc, "updateShipmentStatus", &["SHIP001", "customs", "Rotterdam"])
            .await;
        let delivered = ledger
            .invoke(&cc, "deliverShipment", &["SHIP001", "warehouse"])
            .await;
        assert!(delivered.is_success(), "{delivered:?}");

        // Four provenance records span two pages of two.
        let trace = payload(&ledger.invoke(&cc, "traceProduct", &["PROD001"]).await);
        let actions: Vec<&str> = trace["provenance"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["action"].as_str().unwrap())
            .collect();
        assert_eq!(actions, vec!["CREATE", "SHIP", "TRACK", "DELIVER"]);

        for n in 2..=5 {
            let id = format!("PROD00{n}");
            ledger
                .invoke(&cc, "createProduct", &[id.as_str(), "Tea", "", "SKU", "estate", "food"])
                .await;
        }
        let listed = payload(&ledger.invoke(&cc, "listProducts", &["food"]).await);
        assert_eq!(listed.as_array().unwrap().len(), 5);

        ledger.stop().await;
    }

    // =============================================================================
    // CONTEXT RESOLUTION FAILURES
    // =============================================================================

    #[tokio::test]
    async fn test_no_open_transaction_is_protocol_error() {
        let ledger = RemoteLedger::start(DevNodeConfig::local()).await;
        let transport = Arc::new(JsonRpcTransport::new(
            &ledger.node().url(),
            Duration::from_secs(5),
        ));
        let config = ShimConfig {
            ledger_address: ledger.node().url(),
            ..ShimConfig::default()
        };
        let response = run_invocation(
            &GatewayRegistry,
            transport,
            Invocation::invoke("getGateway", ["gw001"]),
            &config,
        )
        .await;
        assert_eq!(response.kind, Some(ErrorKind::Protocol));
        assert_eq!(response.exit_code(), 7);
        assert_eq!(ledger.node().ledger().committed_len(), 0);

        ledger.stop().await;
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let config = ShimConfig {
            ledger_address: "http://127.0.0.1:1".to_string(),
            ..ShimConfig::default()
        };
        let transport = Arc::new(JsonRpcTransport::new(
            &config.ledger_address,
            Duration::from_secs(2),
        ));
        let response = run_invocation(
            &SupplyChain,
            transport,
            Invocation::invoke("getProduct", ["PROD001"]),
            &config,
        )
        .await;
        assert_eq!(response.kind, Some(ErrorKind::Transport));
        assert_eq!(response.exit_code(), 6);
    }
}
