//! Ledger key layout.
//!
//! | Record | Key |
//! |--------|-----|
//! | gateway | `gateway \0 <id>` |
//! | gateway status index | `gateway~status \0 <status> \0 <id>` |
//! | policy | `policy:<id>` (plain, listed by range) |
//! | audit entry | `audit \0 <recordId>` |
//! | audit by gateway | `audit~gateway \0 <gatewayId> \0 <recordId>` |
//! | audit by action | `audit~action \0 <action> \0 <recordId>` |
//! | system config | `config:system` |

use cc_shim::{create_composite_key, ShimResult};

pub const GATEWAY: &str = "gateway";
pub const GATEWAY_BY_STATUS: &str = "gateway~status";
pub const AUDIT: &str = "audit";
pub const AUDIT_BY_GATEWAY: &str = "audit~gateway";
pub const AUDIT_BY_ACTION: &str = "audit~action";

pub const SYSTEM_CONFIG: &str = "config:system";

const POLICY_PREFIX: &str = "policy:";
/// `';'` is the character after `':'`, so `[policy:, policy;)` covers every policy.
pub const POLICY_RANGE_END: &str = "policy;";

/// Id of the policy written by `init`.
pub const ADMIN_POLICY_ID: &str = "admin";

pub fn gateway(id: &str) -> ShimResult<String> {
    create_composite_key(GATEWAY, &[id])
}

pub fn gateway_by_status(status: &str, id: &str) -> ShimResult<String> {
    create_composite_key(GATEWAY_BY_STATUS, &[status, id])
}

pub fn policy(id: &str) -> String {
    format!("{POLICY_PREFIX}{id}")
}

pub fn policy_range_start() -> &'static str {
    POLICY_PREFIX
}

pub fn audit(record_id: &str) -> ShimResult<String> {
    create_composite_key(AUDIT, &[record_id])
}

pub fn audit_by_gateway(gateway_id: &str, record_id: &str) -> ShimResult<String> {
    create_composite_key(AUDIT_BY_GATEWAY, &[gateway_id, record_id])
}

pub fn audit_by_action(action: &str, record_id: &str) -> ShimResult<String> {
    create_composite_key(AUDIT_BY_ACTION, &[action, record_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_range_covers_policies_only() {
        let key = policy("edge-read");
        assert!(key.as_str() >= policy_range_start() && key.as_str() < POLICY_RANGE_END);
        assert!(!(SYSTEM_CONFIG >= policy_range_start() && SYSTEM_CONFIG < POLICY_RANGE_END));
    }

    #[test]
    fn test_index_keys_are_composite() {
        let key = gateway_by_status("active", "gw1").unwrap();
        assert_eq!(key, "gateway~status\u{0}active\u{0}gw1");
    }
}
