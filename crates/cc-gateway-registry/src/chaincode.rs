//! [`Chaincode`] implementation routing commands to the service layer.

use crate::commands::GatewayCommand;
use crate::service;
use cc_shim::{Chaincode, ChaincodeStub, Response};

#[derive(Debug, Default, Clone, Copy)]
pub struct GatewayRegistry;

impl GatewayRegistry {
    async fn execute(&self, stub: &ChaincodeStub, command: GatewayCommand) -> Response {
        use GatewayCommand::*;
        match command {
            RegisterGateway {
                id,
                public_key,
                organization_id,
            } => service::register_gateway(stub, &id, &public_key, &organization_id)
                .await
                .into(),
            UpdateGateway { id, metadata } => {
                service::update_gateway(stub, &id, &metadata).await.into()
            }
            GetGateway { id } => service::get_gateway(stub, &id).await.into(),
            ListGateways { status } => service::list_gateways(stub, status).await.into(),
            DeactivateGateway { id } => service::deactivate_gateway(stub, &id).await.into(),
            Heartbeat { id } => service::heartbeat(stub, &id).await.into(),
            CreatePolicy {
                id,
                name,
                description,
                rules,
            } => service::create_policy(stub, &id, &name, &description, rules)
                .await
                .into(),
            UpdatePolicy { id, rules } => service::update_policy(stub, &id, rules).await.into(),
            GetPolicy { id } => service::get_policy(stub, &id).await.into(),
            ListPolicies => service::list_policies(stub).await.into(),
            AuditLog {
                gateway_id,
                action,
                resource,
                success,
                error_message,
            } => service::append_audit(
                stub,
                &gateway_id,
                &action,
                &resource,
                success,
                error_message.as_deref(),
            )
            .await
            .into(),
            QueryAuditLogs { gateway_id, action } => {
                service::query_audit_logs(stub, gateway_id.as_deref(), action.as_deref())
                    .await
                    .into()
            }
        }
    }
}

#[async_trait::async_trait]
impl Chaincode for GatewayRegistry {
    fn name(&self) -> &'static str {
        "gateway-registry"
    }

    async fn init(&self, stub: &ChaincodeStub) -> Response {
        service::initialize(stub).await.into()
    }

    async fn invoke(&self, stub: &ChaincodeStub) -> Response {
        let (function, args) = stub.get_function_and_parameters();
        match GatewayCommand::parse(function, args) {
            Ok(command) => self.execute(stub, command).await,
            Err(e) => Response::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys;
    use cc_shim::{ErrorKind, LedgerHarness};

    async fn ready() -> (LedgerHarness, GatewayRegistry) {
        let harness = LedgerHarness::default();
        let registry = GatewayRegistry;
        assert!(harness.init(&registry, &[]).await.is_success());
        (harness, registry)
    }

    #[tokio::test]
    async fn test_init_writes_config_and_admin_policy() {
        let (harness, registry) = ready().await;
        assert!(harness.ledger().committed_value(keys::SYSTEM_CONFIG).is_some());

        let policy = harness.invoke(&registry, "getPolicy", &["admin"]).await;
        assert!(policy.is_success());
        assert_eq!(policy.json()["version"], 1);
        assert_eq!(policy.json()["rules"][0]["principals"][0], "admin");
    }

    #[tokio::test]
    async fn test_register_is_unique() {
        let (harness, registry) = ready().await;
        let first = harness
            .invoke(&registry, "registerGateway", &["gw001", "pk-1", "org1"])
            .await;
        assert!(first.is_success());
        let key = keys::gateway("gw001").unwrap();
        let stored = harness.ledger().committed_value(&key);

        let second = harness
            .invoke(&registry, "registerGateway", &["gw001", "pk-2", "org2"])
            .await;
        assert_eq!(second.response.kind, Some(ErrorKind::AlreadyExists));
        assert!(second.commit.is_none());
        assert_eq!(harness.ledger().committed_value(&key), stored);
    }

    #[tokio::test]
    async fn test_register_emits_event() {
        let (harness, registry) = ready().await;
        harness
            .invoke(&registry, "registerGateway", &["gw001", "pk", "org1"])
            .await;
        let events = harness.ledger().events();
        let event = events.last().unwrap();
        assert_eq!(event.name, service::GATEWAY_REGISTERED_EVENT);
        let payload: serde_json::Value = serde_json::from_slice(&event.payload).unwrap();
        assert_eq!(payload["gatewayID"], "gw001");
        assert_eq!(payload["orgID"], "org1");
    }

    #[tokio::test]
    async fn test_heartbeat_requires_active_gateway() {
        let (harness, registry) = ready().await;
        harness
            .invoke(&registry, "registerGateway", &["gw001", "pk", "org1"])
            .await;
        let beat = harness.invoke(&registry, "heartbeat", &["gw001"]).await;
        assert!(beat.is_success());
        assert!(beat.json()["lastHeartbeat"].as_i64() > beat.json()["registrationTime"].as_i64());

        harness.invoke(&registry, "deactivateGateway", &["gw001"]).await;
        let beat = harness.invoke(&registry, "heartbeat", &["gw001"]).await;
        assert_eq!(beat.response.kind, Some(ErrorKind::FailedPrecondition));

        let missing = harness.invoke(&registry, "heartbeat", &["nope"]).await;
        assert_eq!(missing.response.kind, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_list_gateways_by_status() {
        let (harness, registry) = ready().await;
        for id in ["gw1", "gw2", "gw3"] {
            harness
                .invoke(&registry, "registerGateway", &[id, "pk", "org"])
                .await;
        }
        harness.invoke(&registry, "deactivateGateway", &["gw2"]).await;

        let all = harness.invoke(&registry, "listGateways", &[]).await;
        assert_eq!(all.json().as_array().unwrap().len(), 3);

        let active = harness.invoke(&registry, "listGateways", &["active"]).await;
        let ids: Vec<_> = active
            .json()
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["gw1", "gw3"]);

        let inactive = harness.invoke(&registry, "listGateways", &["inactive"]).await;
        assert_eq!(inactive.json()[0]["id"], "gw2");
    }

    #[tokio::test]
    async fn test_update_gateway_merges_metadata() {
        let (harness, registry) = ready().await;
        harness
            .invoke(&registry, "registerGateway", &["gw1", "pk", "org"])
            .await;
        harness
            .invoke(&registry, "updateGateway", &["gw1", "region", "eu", "tier", "1"])
            .await;
        let updated = harness
            .invoke(&registry, "updateGateway", &["gw1", "tier", "2"])
            .await;
        assert_eq!(updated.json()["metadata"]["region"], "eu");
        assert_eq!(updated.json()["metadata"]["tier"], "2");
    }

    #[tokio::test]
    async fn test_policy_version_counts_updates() {
        let (harness, registry) = ready().await;
        let rules = r#"[{"resource":"sensors","action":"read","principals":["org1"]}]"#;
        let created = harness
            .invoke(&registry, "createPolicy", &["p1", "Sensors", "read access", rules])
            .await;
        assert_eq!(created.json()["version"], 1);

        for _ in 0..3 {
            assert!(harness
                .invoke(&registry, "updatePolicy", &["p1", rules])
                .await
                .is_success());
        }
        let policy = harness.invoke(&registry, "getPolicy", &["p1"]).await;
        assert_eq!(policy.json()["version"], 4);

        let listed = harness.invoke(&registry, "listPolicies", &[]).await;
        assert_eq!(listed.json().as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_audit_queries() {
        let (harness, registry) = ready().await;
        harness
            .invoke(&registry, "registerGateway", &["gw1", "pk", "org"])
            .await;
        harness
            .invoke(&registry, "registerGateway", &["gw2", "pk", "org"])
            .await;
        harness.invoke(&registry, "deactivateGateway", &["gw1"]).await;
        let manual = harness
            .invoke(&registry, "auditLog", &["gw1", "ACCESS", "/data", "false", "denied"])
            .await;
        assert_eq!(manual.json()["errorMessage"], "denied");

        let gw1 = harness.invoke(&registry, "queryAuditLogs", &["gw1"]).await;
        assert_eq!(gw1.json().as_array().unwrap().len(), 3);

        let registrations = harness
            .invoke(&registry, "queryAuditLogs", &["", "REGISTER_GATEWAY"])
            .await;
        assert_eq!(registrations.json().as_array().unwrap().len(), 2);

        let both = harness
            .invoke(&registry, "queryAuditLogs", &["gw1", "DEACTIVATE_GATEWAY"])
            .await;
        assert_eq!(both.json().as_array().unwrap().len(), 1);

        let everything = harness.invoke(&registry, "queryAuditLogs", &[]).await;
        assert_eq!(everything.json().as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_function_rolls_back() {
        let (harness, registry) = ready().await;
        let outcome = harness.invoke(&registry, "launchMissiles", &[]).await;
        assert_eq!(outcome.response.kind, Some(ErrorKind::Validation));
        assert_eq!(outcome.response.exit_code(), 2);
    }
}
