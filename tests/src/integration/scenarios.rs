//! # End-to-End Scenarios (in-process)
//!
//! Each chaincode runs through the real dispatcher against an
//! `InMemoryLedger`; a transaction is committed only when the invocation
//! succeeds, as a node would do with the exit code.

#[cfg(test)]
mod tests {
    use cc_gateway_registry::domain::keys as registry_keys;
    use cc_gateway_registry::GatewayRegistry;
    use cc_identity::domain::credential_digest;
    use cc_identity::IdentityVerification;
    use cc_shim::{ErrorKind, LedgerHarness};
    use cc_supply_chain::SupplyChain;
    use serde_json::Value;

    // =============================================================================
    // FIXTURES
    // =============================================================================

    async fn registry() -> (LedgerHarness, GatewayRegistry) {
        let harness = LedgerHarness::default();
        let cc = GatewayRegistry;
        assert!(harness.init(&cc, &[]).await.is_success());
        (harness, cc)
    }

    async fn identity() -> (LedgerHarness, IdentityVerification) {
        let harness = LedgerHarness::default();
        let cc = IdentityVerification;
        assert!(harness.init(&cc, &[]).await.is_success());
        for (id, kind) in [("university", "university"), ("alice", "person")] {
            let created = harness
                .invoke(&cc, "createIdentity", &[id, "pk", kind, "org1"])
                .await;
            assert!(created.is_success(), "{:?}", created.response);
        }
        (harness, cc)
    }

    async fn issue_credential(
        harness: &LedgerHarness,
        cc: &IdentityVerification,
        id: &str,
        expiration_days: &str,
    ) {
        let issued_at = harness.next_timestamp().timestamp();
        let proof = credential_digest(id, "degree", "university", "alice", issued_at);
        let outcome = harness
            .invoke(
                cc,
                "issueCredential",
                &[
                    id,
                    "degree",
                    "university",
                    "alice",
                    r#"{"field":"physics"}"#,
                    proof.as_str(),
                    expiration_days,
                ],
            )
            .await;
        assert!(outcome.is_success(), "{:?}", outcome.response);
    }

    fn provenance_actions(trace: &Value) -> Vec<&str> {
        trace["provenance"]
            .as_array()
            .unwrap()
            .iter()
            .map(|record| record["action"].as_str().unwrap())
            .collect()
    }

    // =============================================================================
    // SCENARIO A: GATEWAY REGISTRATION
    // =============================================================================

    #[tokio::test]
    async fn test_register_gateway_then_reject_duplicate() {
        let (harness, cc) = registry().await;

        let registered = harness
            .invoke(&cc, "registerGateway", &["gw001", "pk-1", "org1"])
            .await;
        assert!(registered.is_success(), "{:?}", registered.response);
        assert!(registered.commit.is_some());

        let fetched = harness.invoke(&cc, "getGateway", &["gw001"]).await;
        assert_eq!(fetched.json()["status"], "active");

        let key = registry_keys::gateway("gw001").unwrap();
        let stored = harness.ledger().committed_value(&key);
        let keys_before = harness.ledger().committed_len();

        let duplicate = harness
            .invoke(&cc, "registerGateway", &["gw001", "other-key", "org2"])
            .await;
        assert_eq!(duplicate.response.kind, Some(ErrorKind::AlreadyExists));
        assert_eq!(duplicate.response.exit_code(), 4);
        assert!(duplicate.commit.is_none());
        assert_eq!(harness.ledger().committed_value(&key), stored);
        assert_eq!(harness.ledger().committed_len(), keys_before);
    }

    #[tokio::test]
    async fn test_policy_version_grows_by_one_per_update() {
        let (harness, cc) = registry().await;
        let rules = r#"[{"resource":"telemetry","action":"write","principals":["org1"]}]"#;
        harness
            .invoke(&cc, "createPolicy", &["telemetry", "Telemetry", "writers", rules])
            .await;

        for n in 1..=5 {
            let updated = harness
                .invoke(&cc, "updatePolicy", &["telemetry", rules])
                .await;
            assert_eq!(updated.json()["version"], 1 + n);
        }
    }

    // =============================================================================
    // SCENARIO B: CREDENTIAL VERIFICATION
    // =============================================================================

    #[tokio::test]
    async fn test_credential_with_past_expiry_is_invalid() {
        let (harness, cc) = identity().await;
        issue_credential(&harness, &cc, "cred001", "-1").await;

        let verdict = harness
            .invoke(&cc, "verifyCredential", &["cred001"])
            .await
            .json();
        assert_eq!(verdict["valid"], false);
        assert_eq!(verdict["reason"], "expired");
    }

    #[tokio::test]
    async fn test_revocation_outranks_expiry() {
        let (harness, cc) = identity().await;
        issue_credential(&harness, &cc, "cred001", "-1").await;
        let revoked = harness
            .invoke(&cc, "revokeCredential", &["cred001", "university", "withdrawn"])
            .await;
        assert!(revoked.is_success(), "{:?}", revoked.response);

        let verdict = harness
            .invoke(&cc, "verifyCredential", &["cred001"])
            .await
            .json();
        assert_eq!(verdict["reason"], "revoked");

        let events: Vec<String> = harness
            .ledger()
            .events()
            .into_iter()
            .map(|event| event.name)
            .collect();
        assert!(events.contains(&"CredentialIssued".to_string()));
        assert!(events.contains(&"CredentialRevoked".to_string()));
    }

    // =============================================================================
    // SCENARIO C: PRODUCT PROVENANCE
    // =============================================================================

    #[tokio::test]
    async fn test_trace_lists_create_ship_deliver_in_order() {
        let harness = LedgerHarness::default();
        let cc = SupplyChain;
        assert!(harness.init(&cc, &[]).await.is_success());

        let steps: [(&str, &[&str]); 3] = [
            (
                "createProduct",
                &["PROD001", "Coffee", "Single origin", "SKU-C1", "farm-co", "food"],
            ),
            (
                "createShipment",
                &["SHIP001", "PROD001", "Bogota", "Hamburg", "maersk", "TRK-001"],
            ),
            ("deliverShipment", &["SHIP001", "roastery"]),
        ];
        for (function, args) in steps {
            let outcome = harness.invoke(&cc, function, args).await;
            assert!(outcome.is_success(), "{function}: {:?}", outcome.response);
        }

        let trace = harness
            .invoke(&cc, "traceProduct", &["PROD001"])
            .await
            .json();
        assert_eq!(trace["product"]["id"], "PROD001");
        assert_eq!(provenance_actions(&trace), vec!["CREATE", "SHIP", "DELIVER"]);
        assert_eq!(trace["shipments"][0]["status"], "delivered");
    }

    #[tokio::test]
    async fn test_failed_invocation_leaves_ledger_untouched() {
        let harness = LedgerHarness::default();
        let cc = SupplyChain;
        harness.init(&cc, &[]).await;
        let before = harness.ledger().committed_len();

        let orphan = harness
            .invoke(
                &cc,
                "createShipment",
                &["SHIP001", "PROD404", "A", "B", "dhl", "TRK-1"],
            )
            .await;
        assert_eq!(orphan.response.kind, Some(ErrorKind::NotFound));
        assert_eq!(harness.ledger().committed_len(), before);
        assert!(!harness.ledger().has_pending_transaction());
    }
}
