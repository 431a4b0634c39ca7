//! # Gateway Registry Chaincode
//!
//! Registers network gateways, tracks their liveness through heartbeats,
//! versions access policies and keeps an append-only audit trail with
//! lookups by gateway and by action.
//!
//! | Function | Args | Returns |
//! |----------|------|---------|
//! | `init` | none | admin policy |
//! | `registerGateway` | id, publicKey, organizationID | gateway |
//! | `updateGateway` | id, key, value, ... (up to 9 pairs) | gateway |
//! | `getGateway` | id | gateway |
//! | `listGateways` | [status] | gateways |
//! | `deactivateGateway` | id | gateway |
//! | `heartbeat` | id | gateway |
//! | `createPolicy` | id, name, description, rules JSON | policy |
//! | `updatePolicy` | id, rules JSON | policy |
//! | `getPolicy` | id | policy |
//! | `listPolicies` | none | policies |
//! | `auditLog` | gatewayID, action, resource, success, [error] | audit entry |
//! | `queryAuditLogs` | [gatewayID], [action] | audit entries |

pub mod chaincode;
pub mod commands;
pub mod domain;
pub mod service;

pub use chaincode::GatewayRegistry;
pub use commands::GatewayCommand;
pub use domain::{AccessPolicy, AuditEntry, Gateway, GatewayStatus, Rule, SystemConfig};
