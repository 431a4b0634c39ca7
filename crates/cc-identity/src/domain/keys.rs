//! Ledger key layout. Primary records live under composite keys, index
//! entries carry empty values and end with the primary id.

use cc_shim::{create_composite_key, ShimResult};

pub const IDENTITY: &str = "identity";
pub const IDENTITY_BY_TYPE: &str = "identity~type";
pub const CREDENTIAL: &str = "credential";
pub const CREDENTIAL_BY_SUBJECT: &str = "credential~subject";
pub const CREDENTIAL_BY_ISSUER: &str = "credential~issuer";
pub const REVOCATION: &str = "revocation";
pub const REVOCATION_BY_CREDENTIAL: &str = "revocation~credential";
pub const VERIFICATION: &str = "verification";
pub const VERIFICATION_BY_REQUESTER: &str = "verification~requester";

pub const SYSTEM_CONFIG: &str = "config:system";

pub fn identity(id: &str) -> ShimResult<String> {
    create_composite_key(IDENTITY, &[id])
}

pub fn identity_by_type(identity_type: &str, id: &str) -> ShimResult<String> {
    create_composite_key(IDENTITY_BY_TYPE, &[identity_type, id])
}

pub fn credential(id: &str) -> ShimResult<String> {
    create_composite_key(CREDENTIAL, &[id])
}

pub fn credential_by_subject(subject: &str, id: &str) -> ShimResult<String> {
    create_composite_key(CREDENTIAL_BY_SUBJECT, &[subject, id])
}

pub fn credential_by_issuer(issuer: &str, id: &str) -> ShimResult<String> {
    create_composite_key(CREDENTIAL_BY_ISSUER, &[issuer, id])
}

pub fn revocation(record_id: &str) -> ShimResult<String> {
    create_composite_key(REVOCATION, &[record_id])
}

pub fn revocation_by_credential(credential_id: &str, record_id: &str) -> ShimResult<String> {
    create_composite_key(REVOCATION_BY_CREDENTIAL, &[credential_id, record_id])
}

pub fn verification(id: &str) -> ShimResult<String> {
    create_composite_key(VERIFICATION, &[id])
}

pub fn verification_by_requester(requester: &str, id: &str) -> ShimResult<String> {
    create_composite_key(VERIFICATION_BY_REQUESTER, &[requester, id])
}
