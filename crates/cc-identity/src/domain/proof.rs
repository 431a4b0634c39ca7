//! Credential proof digest and verification outcome.

use super::entities::Credential;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Proof type recorded on every issued credential.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";
pub const PROOF_PURPOSE: &str = "assertionMethod";

/// Hex SHA-256 of `id:type:issuer:subject:issuedAt`.
pub fn credential_digest(
    id: &str,
    credential_type: &str,
    issuer: &str,
    subject: &str,
    issued_at: i64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{id}:{credential_type}:{issuer}:{subject}:{issued_at}").as_bytes());
    hex::encode(hasher.finalize())
}

pub fn expected_proof(credential: &Credential) -> String {
    credential_digest(
        &credential.id,
        &credential.credential_type,
        &credential.issuer,
        &credential.subject,
        credential.issued_at,
    )
}

/// Why a credential did or did not verify. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationReason {
    Revoked,
    Expired,
    IssuerInactive,
    InvalidProof,
    Valid,
}

impl VerificationReason {
    pub fn message(&self) -> &'static str {
        match self {
            VerificationReason::Revoked => "Credential has been revoked",
            VerificationReason::Expired => "Credential has expired",
            VerificationReason::IssuerInactive => "Issuer is not active",
            VerificationReason::InvalidProof => "Invalid credential signature",
            VerificationReason::Valid => "Credential is valid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub valid: bool,
    pub reason: VerificationReason,
    pub message: String,
    pub details: Map<String, Value>,
    pub verified_at: i64,
}

impl VerificationOutcome {
    pub fn new(reason: VerificationReason, details: Map<String, Value>, verified_at: i64) -> Self {
        Self {
            valid: reason == VerificationReason::Valid,
            reason,
            message: reason.message().to_string(),
            details,
            verified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_hex() {
        let digest = credential_digest("cred001", "academic", "uni", "alice", 1_704_067_200);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            digest,
            credential_digest("cred001", "academic", "uni", "alice", 1_704_067_200)
        );
        assert_ne!(
            digest,
            credential_digest("cred001", "academic", "uni", "alice", 1_704_067_201)
        );
    }

    #[test]
    fn test_outcome_validity_follows_reason() {
        let ok = VerificationOutcome::new(VerificationReason::Valid, Map::new(), 5);
        assert!(ok.valid);
        let expired = VerificationOutcome::new(VerificationReason::Expired, Map::new(), 5);
        assert!(!expired.valid);
        let json = serde_json::to_value(&expired).unwrap();
        assert_eq!(json["reason"], "expired");
        assert_eq!(json["verifiedAt"], 5);
    }
}
