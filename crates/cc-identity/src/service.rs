//! Identity, credential, verification and revocation operations.
//!
//! Revocation state is always derived from the revocation records reached
//! through the `revocation~credential` index. The `status` field stored on a
//! credential is a cache for readers and is never consulted here.

use crate::commands::{CredentialFilter, IssueCredential, RequestVerification, VerificationFilter};
use crate::domain::entities::{AUTHORITY_TYPE, DEFAULT_VALIDITY_DAYS, ROOT_AUTHORITY_ID, SECONDS_PER_DAY};
use crate::domain::proof::{self, PROOF_PURPOSE, PROOF_TYPE};
use crate::domain::{
    keys, Attributes, Credential, CredentialStatus, Identity, IdentityConfig, IdentityStatus,
    Proof, RevocationRecord, VerificationOutcome, VerificationReason, VerificationRequest,
    VerificationStatus,
};
use cc_shim::{ChaincodeError, ChaincodeStub};
use serde::Serialize;
use serde_json::{json, Map, Value};

type Result<T> = std::result::Result<T, ChaincodeError>;

pub const IDENTITY_CREATED_EVENT: &str = "IdentityCreated";
pub const CREDENTIAL_ISSUED_EVENT: &str = "CredentialIssued";
pub const CREDENTIAL_REVOKED_EVENT: &str = "CredentialRevoked";

async fn now(stub: &ChaincodeStub) -> Result<i64> {
    Ok(stub.get_tx_timestamp().await?.timestamp())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// =============================================================================
// INIT
// =============================================================================

pub async fn initialize(stub: &ChaincodeStub) -> Result<Identity> {
    stub.put_state_json(keys::SYSTEM_CONFIG, &IdentityConfig::default())
        .await?;

    let now = now(stub).await?;
    let root = Identity {
        id: ROOT_AUTHORITY_ID.to_string(),
        public_key: "root-public-key-placeholder".to_string(),
        identity_type: AUTHORITY_TYPE.to_string(),
        organization: "BEACON Network".to_string(),
        status: IdentityStatus::Active,
        created_at: now,
        updated_at: now,
        expires_at: None,
        attributes: Attributes::new(),
        metadata: Attributes::new(),
    };
    store_new_identity(stub, &root).await?;
    tracing::info!("Identity chaincode initialised");
    Ok(root)
}

// =============================================================================
// IDENTITIES
// =============================================================================

async fn load_identity(stub: &ChaincodeStub, entity: &'static str, id: &str) -> Result<Identity> {
    stub.get_state_json(&keys::identity(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found(entity, id))
}

async fn store_new_identity(stub: &ChaincodeStub, identity: &Identity) -> Result<()> {
    stub.put_state_json(&keys::identity(&identity.id)?, identity)
        .await?;
    stub.put_state(
        &keys::identity_by_type(&identity.identity_type, &identity.id)?,
        &[],
    )
    .await?;
    Ok(())
}

pub async fn create_identity(
    stub: &ChaincodeStub,
    id: &str,
    public_key: &str,
    identity_type: &str,
    organization: &str,
) -> Result<Identity> {
    if stub.get_state(&keys::identity(id)?).await?.is_some() {
        return Err(ChaincodeError::already_exists("Identity", id));
    }

    let now = now(stub).await?;
    let expires_at = (identity_type != AUTHORITY_TYPE)
        .then(|| now.saturating_add(DEFAULT_VALIDITY_DAYS * SECONDS_PER_DAY));
    let identity = Identity {
        id: id.to_string(),
        public_key: public_key.to_string(),
        identity_type: identity_type.to_string(),
        organization: organization.to_string(),
        status: IdentityStatus::Active,
        created_at: now,
        updated_at: now,
        expires_at,
        attributes: Attributes::new(),
        metadata: Attributes::new(),
    };
    store_new_identity(stub, &identity).await?;

    stub.set_event_json(
        IDENTITY_CREATED_EVENT,
        &json!({
            "action": "identity_created",
            "identityID": id,
            "type": identity_type,
            "organization": organization,
        }),
    )
    .await?;
    tracing::info!(identity = id, identity_type, "Identity created");
    Ok(identity)
}

pub async fn update_identity(
    stub: &ChaincodeStub,
    id: &str,
    attributes: &[(String, String)],
) -> Result<Identity> {
    let mut identity = load_identity(stub, "Identity", id).await?;
    for (key, value) in attributes {
        identity
            .attributes
            .insert(key.clone(), Value::String(value.clone()));
    }
    identity.updated_at = now(stub).await?;
    stub.put_state_json(&keys::identity(id)?, &identity).await?;
    Ok(identity)
}

pub async fn get_identity(stub: &ChaincodeStub, id: &str) -> Result<Identity> {
    load_identity(stub, "Identity", id).await
}

pub async fn list_identities(
    stub: &ChaincodeStub,
    identity_type: Option<&str>,
) -> Result<Vec<Identity>> {
    let identities = match identity_type {
        Some(t) => {
            stub.get_indexed_json(keys::IDENTITY_BY_TYPE, &[t], keys::IDENTITY)
                .await?
        }
        None => stub.get_composite_json::<_, &str>(keys::IDENTITY, &[]).await?,
    };
    Ok(identities)
}

pub async fn revoke_identity(stub: &ChaincodeStub, id: &str, reason: &str) -> Result<Identity> {
    let mut identity = load_identity(stub, "Identity", id).await?;
    if !identity.is_active() {
        return Err(ChaincodeError::failed_precondition(format!(
            "Identity {id} is already revoked"
        )));
    }
    let now = now(stub).await?;
    identity.status = IdentityStatus::Revoked;
    identity.updated_at = now;
    identity
        .metadata
        .insert("revocationReason".to_string(), Value::from(reason));
    identity
        .metadata
        .insert("revokedAt".to_string(), Value::from(now));
    stub.put_state_json(&keys::identity(id)?, &identity).await?;
    tracing::info!(identity = id, reason, "Identity revoked");
    Ok(identity)
}

// =============================================================================
// CREDENTIALS
// =============================================================================

async fn load_credential(stub: &ChaincodeStub, id: &str) -> Result<Credential> {
    stub.get_state_json(&keys::credential(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Credential", id))
}

pub async fn issue_credential(stub: &ChaincodeStub, issue: IssueCredential) -> Result<Credential> {
    let key = keys::credential(&issue.id)?;
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists("Credential", &issue.id));
    }

    let issuer = load_identity(stub, "Issuer identity", &issue.issuer).await?;
    if !issuer.is_active() {
        return Err(ChaincodeError::failed_precondition(format!(
            "Issuer identity is not active: {}",
            issue.issuer
        )));
    }
    load_identity(stub, "Subject identity", &issue.subject).await?;

    let now = now(stub).await?;
    // Zero days stores no expiry.
    let expires_at = match issue.expiration_days {
        0 => 0,
        days => now.saturating_add(days.saturating_mul(SECONDS_PER_DAY)),
    };
    let credential = Credential {
        id: issue.id,
        credential_type: issue.credential_type,
        issuer: issue.issuer,
        subject: issue.subject,
        issued_at: now,
        expires_at,
        status: CredentialStatus::Active,
        claims: issue.claims,
        proof: Proof {
            proof_type: PROOF_TYPE.to_string(),
            created: now,
            verification_method: issuer.public_key,
            proof_purpose: PROOF_PURPOSE.to_string(),
            proof_value: issue.proof_value,
        },
        metadata: Attributes::new(),
    };

    stub.put_state_json(&key, &credential).await?;
    stub.put_state(
        &keys::credential_by_subject(&credential.subject, &credential.id)?,
        &[],
    )
    .await?;
    stub.put_state(
        &keys::credential_by_issuer(&credential.issuer, &credential.id)?,
        &[],
    )
    .await?;

    stub.set_event_json(
        CREDENTIAL_ISSUED_EVENT,
        &json!({
            "action": "credential_issued",
            "credentialID": credential.id,
            "type": credential.credential_type,
            "issuer": credential.issuer,
            "subject": credential.subject,
        }),
    )
    .await?;
    tracing::info!(credential = %credential.id, issuer = %credential.issuer, "Credential issued");
    Ok(credential)
}

async fn active_revocations(stub: &ChaincodeStub, credential_id: &str) -> Result<Vec<RevocationRecord>> {
    let records: Vec<RevocationRecord> = stub
        .get_indexed_json(keys::REVOCATION_BY_CREDENTIAL, &[credential_id], keys::REVOCATION)
        .await?;
    Ok(records.into_iter().filter(RevocationRecord::is_active).collect())
}

async fn is_revoked(stub: &ChaincodeStub, credential_id: &str) -> Result<bool> {
    Ok(!active_revocations(stub, credential_id).await?.is_empty())
}

/// Checks in order: revocation, expiry, issuer status, proof.
pub async fn verify_credential(stub: &ChaincodeStub, id: &str) -> Result<VerificationOutcome> {
    let credential = load_credential(stub, id).await?;
    let now = now(stub).await?;

    let (reason, details) = if is_revoked(stub, id).await? {
        (
            VerificationReason::Revoked,
            json!({ "credentialID": id, "status": "revoked" }),
        )
    } else if credential.is_expired_at(now) {
        (
            VerificationReason::Expired,
            json!({ "credentialID": id, "status": "expired", "expiresAt": credential.expires_at }),
        )
    } else if !issuer_is_active(stub, &credential.issuer).await? {
        (
            VerificationReason::IssuerInactive,
            json!({ "credentialID": id, "issuer": credential.issuer }),
        )
    } else if credential.proof.proof_value != proof::expected_proof(&credential) {
        (
            VerificationReason::InvalidProof,
            json!({ "credentialID": id }),
        )
    } else {
        (
            VerificationReason::Valid,
            json!({
                "credentialID": id,
                "type": credential.credential_type,
                "issuer": credential.issuer,
                "subject": credential.subject,
                "verifiedAt": now,
            }),
        )
    };

    tracing::debug!(credential = id, ?reason, "Credential verified");
    Ok(VerificationOutcome::new(reason, object(details), now))
}

async fn issuer_is_active(stub: &ChaincodeStub, issuer: &str) -> Result<bool> {
    let identity: Option<Identity> = stub.get_state_json(&keys::identity(issuer)?).await?;
    Ok(identity.is_some_and(|i| i.is_active()))
}

pub async fn get_credential(stub: &ChaincodeStub, id: &str) -> Result<Credential> {
    load_credential(stub, id).await
}

/// Uses the subject index, else the issuer index, else a full scan; the
/// remaining filters are applied to the fetched records.
pub async fn list_credentials(
    stub: &ChaincodeStub,
    filter: &CredentialFilter,
) -> Result<Vec<Credential>> {
    let credentials: Vec<Credential> = match (&filter.subject, &filter.issuer) {
        (Some(subject), _) => {
            stub.get_indexed_json(keys::CREDENTIAL_BY_SUBJECT, &[subject], keys::CREDENTIAL)
                .await?
        }
        (None, Some(issuer)) => {
            stub.get_indexed_json(keys::CREDENTIAL_BY_ISSUER, &[issuer], keys::CREDENTIAL)
                .await?
        }
        (None, None) => {
            stub.get_composite_json::<_, &str>(keys::CREDENTIAL, &[])
                .await?
        }
    };
    let matches = |wanted: &Option<String>, actual: &str| {
        wanted.as_deref().map_or(true, |w| w == actual)
    };
    Ok(credentials
        .into_iter()
        .filter(|c| {
            matches(&filter.subject, &c.subject)
                && matches(&filter.issuer, &c.issuer)
                && matches(&filter.credential_type, &c.credential_type)
        })
        .collect())
}

/// Appends a revocation record, then refreshes the cached status on the
/// credential.
pub async fn revoke_credential(
    stub: &ChaincodeStub,
    id: &str,
    issuer: &str,
    reason: &str,
) -> Result<RevocationRecord> {
    let mut credential = load_credential(stub, id).await?;
    if credential.issuer != issuer {
        return Err(ChaincodeError::failed_precondition(
            "Only the issuer can revoke this credential",
        ));
    }
    if is_revoked(stub, id).await? {
        return Err(ChaincodeError::failed_precondition(format!(
            "Credential {id} is already revoked"
        )));
    }

    let now = now(stub).await?;
    let record = RevocationRecord {
        id: stub.unique_record_id().await?,
        credential_id: id.to_string(),
        issuer: issuer.to_string(),
        reason: reason.to_string(),
        revoked_at: now,
        status: RevocationRecord::ACTIVE.to_string(),
        metadata: Attributes::new(),
    };
    stub.put_state_json(&keys::revocation(&record.id)?, &record)
        .await?;
    stub.put_state(&keys::revocation_by_credential(id, &record.id)?, &[])
        .await?;

    credential.status = CredentialStatus::Revoked;
    credential
        .metadata
        .insert("revokedAt".to_string(), Value::from(now));
    credential
        .metadata
        .insert("revocationReason".to_string(), Value::from(reason));
    stub.put_state_json(&keys::credential(id)?, &credential)
        .await?;

    stub.set_event_json(
        CREDENTIAL_REVOKED_EVENT,
        &json!({
            "action": "credential_revoked",
            "credentialID": id,
            "issuer": issuer,
            "reason": reason,
        }),
    )
    .await?;
    tracing::info!(credential = id, issuer, "Credential revoked");
    Ok(record)
}

// =============================================================================
// VERIFICATION REQUESTS
// =============================================================================

async fn load_request(stub: &ChaincodeStub, id: &str) -> Result<VerificationRequest> {
    stub.get_state_json(&keys::verification(id)?)
        .await?
        .ok_or_else(|| ChaincodeError::not_found("Verification request", id))
}

pub async fn request_verification(
    stub: &ChaincodeStub,
    request: RequestVerification,
) -> Result<VerificationRequest> {
    load_identity(stub, "Requester identity", &request.requester).await?;
    let key = keys::verification(&request.id)?;
    if stub.get_state(&key).await?.is_some() {
        return Err(ChaincodeError::already_exists(
            "Verification request",
            &request.id,
        ));
    }

    let record = VerificationRequest {
        id: request.id,
        requester_id: request.requester,
        subject_id: request.subject,
        credential_id: request.credential,
        purpose: request.purpose,
        status: VerificationStatus::Pending,
        requested_at: now(stub).await?,
        responded_at: None,
        result: None,
        metadata: Attributes::new(),
    };
    stub.put_state_json(&key, &record).await?;
    stub.put_state(
        &keys::verification_by_requester(&record.requester_id, &record.id)?,
        &[],
    )
    .await?;
    Ok(record)
}

pub async fn respond_to_verification(
    stub: &ChaincodeStub,
    id: &str,
    decision: VerificationStatus,
    result: Attributes,
) -> Result<VerificationRequest> {
    let mut request = load_request(stub, id).await?;
    if request.status != VerificationStatus::Pending {
        return Err(ChaincodeError::failed_precondition(format!(
            "Verification request {id} was already {}",
            request.status
        )));
    }
    request.status = decision;
    request.responded_at = Some(now(stub).await?);
    request.result = Some(result);
    stub.put_state_json(&keys::verification(id)?, &request)
        .await?;
    Ok(request)
}

pub async fn get_verification_request(
    stub: &ChaincodeStub,
    id: &str,
) -> Result<VerificationRequest> {
    load_request(stub, id).await
}

pub async fn list_verification_requests(
    stub: &ChaincodeStub,
    filter: &VerificationFilter,
) -> Result<Vec<VerificationRequest>> {
    let requests: Vec<VerificationRequest> = match &filter.requester {
        Some(requester) => {
            stub.get_indexed_json(
                keys::VERIFICATION_BY_REQUESTER,
                &[requester],
                keys::VERIFICATION,
            )
            .await?
        }
        None => {
            stub.get_composite_json::<_, &str>(keys::VERIFICATION, &[])
                .await?
        }
    };
    Ok(requests
        .into_iter()
        .filter(|r| filter.subject.as_deref().map_or(true, |s| r.subject_id == s))
        .filter(|r| filter.status.map_or(true, |s| r.status == s))
        .collect())
}

// =============================================================================
// REVOCATIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatus {
    #[serde(rename = "credentialID")]
    pub credential_id: String,
    pub revoked: bool,
    pub checked_at: i64,
}

pub async fn check_revocation_status(
    stub: &ChaincodeStub,
    credential_id: &str,
) -> Result<RevocationStatus> {
    Ok(RevocationStatus {
        credential_id: credential_id.to_string(),
        revoked: is_revoked(stub, credential_id).await?,
        checked_at: now(stub).await?,
    })
}

pub async fn list_revocations(stub: &ChaincodeStub) -> Result<Vec<RevocationRecord>> {
    Ok(stub
        .get_composite_json::<_, &str>(keys::REVOCATION, &[])
        .await?)
}
