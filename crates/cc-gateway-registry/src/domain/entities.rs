//! Registry entities. All timestamps are Unix seconds taken from the
//! transaction timestamp.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Active,
    Inactive,
}

impl GatewayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayStatus::Active => "active",
            GatewayStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for GatewayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GatewayStatus::Active),
            "inactive" => Ok(GatewayStatus::Inactive),
            other => Err(format!("unknown gateway status {other:?}")),
        }
    }
}

/// A gateway registered in the network. Never physically deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub id: String,
    pub public_key: String,
    #[serde(rename = "organizationID")]
    pub organization_id: String,
    pub status: GatewayStatus,
    pub registration_time: i64,
    pub last_heartbeat: i64,
    /// Ordered map so every node serializes identical bytes.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Gateway {
    pub fn is_active(&self) -> bool {
        self.status == GatewayStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub principals: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// Access policy. `version` starts at 1 and grows by one per update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rules: Vec<Rule>,
    pub created_at: i64,
    pub updated_at: i64,
    pub version: u64,
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: i64,
    #[serde(rename = "gatewayID")]
    pub gateway_id: String,
    pub action: String,
    pub resource: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(rename = "transactionID")]
    pub transaction_id: String,
}

/// Registry-wide settings written by `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    pub version: String,
    pub max_gateways: u32,
    /// Seconds without a heartbeat before a gateway is considered stale.
    pub heartbeat_timeout: u32,
    pub policy_versioning: bool,
    pub audit_logging_enabled: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            max_gateways: 1000,
            heartbeat_timeout: 300,
            policy_versioning: true,
            audit_logging_enabled: true,
        }
    }
}

/// Audit action names.
pub mod actions {
    pub const REGISTER_GATEWAY: &str = "REGISTER_GATEWAY";
    pub const UPDATE_GATEWAY: &str = "UPDATE_GATEWAY";
    pub const DEACTIVATE_GATEWAY: &str = "DEACTIVATE_GATEWAY";
    pub const CREATE_POLICY: &str = "CREATE_POLICY";
    pub const UPDATE_POLICY: &str = "UPDATE_POLICY";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_json_field_names() {
        let gateway = Gateway {
            id: "gw001".into(),
            public_key: "pk".into(),
            organization_id: "org1".into(),
            status: GatewayStatus::Active,
            registration_time: 1,
            last_heartbeat: 1,
            metadata: BTreeMap::new(),
        };
        let json = serde_json::to_value(&gateway).unwrap();
        assert_eq!(json["organizationID"], "org1");
        assert_eq!(json["publicKey"], "pk");
        assert_eq!(json["status"], "active");
    }

    #[test]
    fn test_rule_defaults() {
        let rule: Rule = serde_json::from_str(r#"{"resource":"*","action":"read"}"#).unwrap();
        assert!(rule.principals.is_empty());
        assert!(rule.conditions.is_empty());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("inactive".parse::<GatewayStatus>(), Ok(GatewayStatus::Inactive));
        assert!("paused".parse::<GatewayStatus>().is_err());
    }
}
