pub mod entities;
pub mod keys;

pub use entities::{AccessPolicy, AuditEntry, Gateway, GatewayStatus, Rule, SystemConfig};
