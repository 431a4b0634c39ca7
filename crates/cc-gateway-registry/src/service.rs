//! Registry operations on top of the stub.

use crate::domain::entities::actions;
use crate::domain::keys;
use crate::domain::{AccessPolicy, AuditEntry, Gateway, GatewayStatus, Rule, SystemConfig};
use cc_shim::{ChaincodeError, ChaincodeStub, KeyValue};
use serde_json::json;
use std::collections::BTreeMap;

type Result<T> = std::result::Result<T, ChaincodeError>;

/// Event emitted when a gateway is registered.
pub const GATEWAY_REGISTERED_EVENT: &str = "GatewayRegistered";

async fn now(stub: &ChaincodeStub) -> Result<i64> {
    Ok(stub.get_tx_timestamp().await?.timestamp())
}

// =============================================================================
// INIT
// =============================================================================

pub async fn initialize(stub: &ChaincodeStub) -> Result<AccessPolicy> {
    stub.put_state_json(keys::SYSTEM_CONFIG, &SystemConfig::default())
        .await?;

    let now = now(stub).await?;
    let admin = AccessPolicy {
        id: keys::ADMIN_POLICY_ID.to_string(),
        name: "Administrator Policy".to_string(),
        description: "Full administrative access to all resources".to_string(),
        rules: vec![Rule {
            resource: "*".to_string(),
            action: "*".to_string(),
            principals: vec!["admin".to_string()],
            conditions: Vec::new(),
        }],
        created_at: now,
        updated_at: now,
        version: 1,
    };
    stub.put_state_json(&keys::policy(&admin.id), &admin).await?;
    tracing::info!("Gateway registry initialised");
    Ok(admin)
}

// =============================================================================
// GATEWAYS
// =============================================================================

async fn load_gateway(stub: &ChaincodeStub, id: &str) -> Result<Gateway> {
    stub.get_state_json(&keys::gateway(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Gateway", id))
}

pub async fn register_gateway(
    stub: &ChaincodeStub,
    id: &str,
    public_key: &str,
    organization_id: &str,
) -> Result<Gateway> {
    let key = keys::gateway(id)?;
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists("Gateway", id));
    }

    let now = now(stub).await?;
    let gateway = Gateway {
        id: id.to_string(),
        public_key: public_key.to_string(),
        organization_id: organization_id.to_string(),
        status: GatewayStatus::Active,
        registration_time: now,
        last_heartbeat: now,
        metadata: BTreeMap::new(),
    };
    stub.put_state_json(&key, &gateway).await?;
    stub.put_state(&keys::gateway_by_status(gateway.status.as_str(), id)?, &[])
        .await?;

    append_audit(stub, id, actions::REGISTER_GATEWAY, &key, true, None).await?;
    stub.set_event_json(
        GATEWAY_REGISTERED_EVENT,
        &json!({
            "action": "gateway_registered",
            "gatewayID": id,
            "orgID": organization_id,
        }),
    )
    .await?;
    tracing::info!(gateway = id, org = organization_id, "Gateway registered");
    Ok(gateway)
}

pub async fn update_gateway(
    stub: &ChaincodeStub,
    id: &str,
    metadata: &[(String, String)],
) -> Result<Gateway> {
    let mut gateway = load_gateway(stub, id).await?;
    for (key, value) in metadata {
        gateway.metadata.insert(key.clone(), value.clone());
    }
    let key = keys::gateway(id)?;
    stub.put_state_json(&key, &gateway).await?;
    append_audit(stub, id, actions::UPDATE_GATEWAY, &key, true, None).await?;
    Ok(gateway)
}

pub async fn get_gateway(stub: &ChaincodeStub, id: &str) -> Result<Gateway> {
    load_gateway(stub, id).await
}

pub async fn list_gateways(
    stub: &ChaincodeStub,
    status: Option<GatewayStatus>,
) -> Result<Vec<Gateway>> {
    let gateways = match status {
        Some(status) => {
            stub.get_indexed_json(keys::GATEWAY_BY_STATUS, &[status.as_str()], keys::GATEWAY)
                .await?
        }
        None => stub.get_composite_json::<_, &str>(keys::GATEWAY, &[]).await?,
    };
    Ok(gateways)
}

pub async fn deactivate_gateway(stub: &ChaincodeStub, id: &str) -> Result<Gateway> {
    let mut gateway = load_gateway(stub, id).await?;
    if gateway.status != GatewayStatus::Inactive {
        stub.del_state(&keys::gateway_by_status(gateway.status.as_str(), id)?)
            .await?;
        gateway.status = GatewayStatus::Inactive;
        stub.put_state(&keys::gateway_by_status(gateway.status.as_str(), id)?, &[])
            .await?;
    }
    let key = keys::gateway(id)?;
    stub.put_state_json(&key, &gateway).await?;
    append_audit(stub, id, actions::DEACTIVATE_GATEWAY, &key, true, None).await?;
    tracing::info!(gateway = id, "Gateway deactivated");
    Ok(gateway)
}

pub async fn heartbeat(stub: &ChaincodeStub, id: &str) -> Result<Gateway> {
    let mut gateway = load_gateway(stub, id).await?;
    if !gateway.is_active() {
        return Err(ChaincodeError::failed_precondition(format!(
            "Gateway {id} is inactive"
        )));
    }
    gateway.last_heartbeat = now(stub).await?;
    stub.put_state_json(&keys::gateway(id)?, &gateway).await?;
    Ok(gateway)
}

// =============================================================================
// POLICIES
// =============================================================================

async fn load_policy(stub: &ChaincodeStub, id: &str) -> Result<AccessPolicy> {
    stub.get_state_json(&keys::policy(id))
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Policy", id))
}

pub async fn create_policy(
    stub: &ChaincodeStub,
    id: &str,
    name: &str,
    description: &str,
    rules: Vec<Rule>,
) -> Result<AccessPolicy> {
    let key = keys::policy(id);
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists("Policy", id));
    }
    let now = now(stub).await?;
    let policy = AccessPolicy {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        rules,
        created_at: now,
        updated_at: now,
        version: 1,
    };
    stub.put_state_json(&key, &policy).await?;
    append_audit(stub, "", actions::CREATE_POLICY, &key, true, None).await?;
    Ok(policy)
}

/// Replace the rules and bump the version. Read-modify-write of the whole record.
pub async fn update_policy(stub: &ChaincodeStub, id: &str, rules: Vec<Rule>) -> Result<AccessPolicy> {
    let mut policy = load_policy(stub, id).await?;
    policy.rules = rules;
    policy.updated_at = now(stub).await?;
    policy.version += 1;

    let key = keys::policy(id);
    stub.put_state_json(&key, &policy).await?;
    append_audit(stub, "", actions::UPDATE_POLICY, &key, true, None).await?;
    tracing::debug!(policy = id, version = policy.version, "Policy updated");
    Ok(policy)
}

pub async fn get_policy(stub: &ChaincodeStub, id: &str) -> Result<AccessPolicy> {
    load_policy(stub, id).await
}

pub async fn list_policies(stub: &ChaincodeStub) -> Result<Vec<AccessPolicy>> {
    let entries = stub
        .get_state_by_range_all(keys::policy_range_start(), keys::POLICY_RANGE_END)
        .await?;
    Ok(entries
        .iter()
        .map(KeyValue::decode)
        .collect::<std::result::Result<_, _>>()?)
}

// =============================================================================
// AUDIT
// =============================================================================

/// Append one audit entry plus its gateway and action index entries.
pub async fn append_audit(
    stub: &ChaincodeStub,
    gateway_id: &str,
    action: &str,
    resource: &str,
    success: bool,
    error_message: Option<&str>,
) -> Result<AuditEntry> {
    let entry = AuditEntry {
        id: stub.unique_record_id().await?,
        timestamp: now(stub).await?,
        gateway_id: gateway_id.to_string(),
        action: action.to_string(),
        resource: resource.to_string(),
        success,
        error_message: error_message.map(str::to_string),
        transaction_id: stub.get_tx_id().await?.to_string(),
    };
    stub.put_state_json(&keys::audit(&entry.id)?, &entry).await?;
    if !gateway_id.is_empty() {
        stub.put_state(&keys::audit_by_gateway(gateway_id, &entry.id)?, &[])
            .await?;
    }
    stub.put_state(&keys::audit_by_action(action, &entry.id)?, &[])
        .await?;
    Ok(entry)
}

pub async fn query_audit_logs(
    stub: &ChaincodeStub,
    gateway_id: Option<&str>,
    action: Option<&str>,
) -> Result<Vec<AuditEntry>> {
    let entries: Vec<AuditEntry> = match (gateway_id, action) {
        (Some(gateway_id), action) => {
            let entries: Vec<AuditEntry> = stub
                .get_indexed_json(keys::AUDIT_BY_GATEWAY, &[gateway_id], keys::AUDIT)
                .await?;
            entries
                .into_iter()
                .filter(|e| action.map_or(true, |a| e.action == a))
                .collect()
        }
        (None, Some(action)) => {
            stub.get_indexed_json(keys::AUDIT_BY_ACTION, &[action], keys::AUDIT)
                .await?
        }
        (None, None) => stub.get_composite_json::<_, &str>(keys::AUDIT, &[]).await?,
    };
    Ok(entries)
}
