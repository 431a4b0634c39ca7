//! Identity and credential records. Timestamps are Unix seconds from the
//! transaction timestamp.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Free-form JSON attributes, ordered so every node writes identical bytes.
pub type Attributes = BTreeMap<String, Value>;

/// Identity type exempt from expiry.
pub const AUTHORITY_TYPE: &str = "authority";

/// Id of the identity written by `init`.
pub const ROOT_AUTHORITY_ID: &str = "root-authority";

/// Default lifetime of identities and credentials.
pub const DEFAULT_VALIDITY_DAYS: i64 = 365;
pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStatus {
    Active,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub public_key: String,
    #[serde(rename = "type")]
    pub identity_type: String,
    pub organization: String,
    pub status: IdentityStatus,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub metadata: Attributes,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.status == IdentityStatus::Active
    }
}

/// Cached credential status. Revocation records are authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: i64,
    pub verification_method: String,
    pub proof_purpose: String,
    pub proof_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub issuer: String,
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub status: CredentialStatus,
    #[serde(default)]
    pub claims: Attributes,
    pub proof: Proof,
    #[serde(default)]
    pub metadata: Attributes,
}

impl Credential {
    /// `expires_at == 0` means the credential never expires.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at > 0 && self.expires_at < now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Denied,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "approved" => Ok(VerificationStatus::Approved),
            "denied" => Ok(VerificationStatus::Denied),
            other => Err(format!("unknown verification status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: String,
    #[serde(rename = "requesterID")]
    pub requester_id: String,
    #[serde(rename = "subjectID")]
    pub subject_id: String,
    #[serde(rename = "credentialID")]
    pub credential_id: String,
    pub purpose: String,
    pub status: VerificationStatus,
    pub requested_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Attributes>,
    #[serde(default)]
    pub metadata: Attributes,
}

/// Append-only. Never rewritten once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRecord {
    pub id: String,
    #[serde(rename = "credentialID")]
    pub credential_id: String,
    pub issuer: String,
    pub reason: String,
    pub revoked_at: i64,
    pub status: String,
    #[serde(default)]
    pub metadata: Attributes,
}

impl RevocationRecord {
    pub const ACTIVE: &'static str = "active";

    pub fn is_active(&self) -> bool {
        self.status == Self::ACTIVE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    pub version: String,
    pub max_identities: u64,
    pub max_credentials: u64,
    /// Seconds.
    pub default_credential_validity: i64,
    pub supported_credential_types: Vec<String>,
    pub supported_proof_types: Vec<String>,
    pub auto_verification_enabled: bool,
    pub revocation_enabled: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            max_identities: 100_000,
            max_credentials: 500_000,
            default_credential_validity: DEFAULT_VALIDITY_DAYS * SECONDS_PER_DAY,
            supported_credential_types: strings(&[
                "academic",
                "professional",
                "certification",
                "authorization",
            ]),
            supported_proof_types: strings(&[
                "Ed25519Signature2020",
                "RsaSignature2018",
                "EcdsaSecp256k1Signature2019",
            ]),
            auto_verification_enabled: true,
            revocation_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_omits_missing_expiry() {
        let identity = Identity {
            id: ROOT_AUTHORITY_ID.into(),
            public_key: "pk".into(),
            identity_type: AUTHORITY_TYPE.into(),
            organization: "net".into(),
            status: IdentityStatus::Active,
            created_at: 1,
            updated_at: 1,
            expires_at: None,
            attributes: Attributes::new(),
            metadata: Attributes::new(),
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["type"], "authority");
        assert!(json.get("expiresAt").is_none());
    }

    #[test]
    fn test_verification_status_parse() {
        assert_eq!("denied".parse::<VerificationStatus>(), Ok(VerificationStatus::Denied));
        assert!("maybe".parse::<VerificationStatus>().is_err());
    }

    #[test]
    fn test_config_validity_is_one_year() {
        assert_eq!(IdentityConfig::default().default_credential_validity, 31_536_000);
    }
}
