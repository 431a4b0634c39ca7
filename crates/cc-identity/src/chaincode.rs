use crate::commands::IdentityCommand;
use crate::service;
use cc_shim::{Chaincode, ChaincodeStub, Response};

/// Identity and credential chaincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityVerification;

#[async_trait::async_trait]
impl Chaincode for IdentityVerification {
    fn name(&self) -> &'static str {
        "identity-verification"
    }

    async fn init(&self, stub: &ChaincodeStub) -> Response {
        service::initialize(stub).await.into()
    }

    async fn invoke(&self, stub: &ChaincodeStub) -> Response {
        let (function, args) = stub.get_function_and_parameters();
        let command = match IdentityCommand::parse(function, args) {
            Ok(command) => command,
            Err(e) => return e.into(),
        };

        use IdentityCommand::*;
        match command {
            CreateIdentity {
                id,
                public_key,
                identity_type,
                organization,
            } => service::create_identity(stub, &id, &public_key, &identity_type, &organization)
                .await
                .into(),
            UpdateIdentity { id, attributes } => {
                service::update_identity(stub, &id, &attributes).await.into()
            }
            GetIdentity(id) => service::get_identity(stub, &id).await.into(),
            ListIdentities { identity_type } => {
                service::list_identities(stub, identity_type.as_deref())
                    .await
                    .into()
            }
            RevokeIdentity { id, reason } => {
                service::revoke_identity(stub, &id, &reason).await.into()
            }
            IssueCredential(issue) => service::issue_credential(stub, issue).await.into(),
            VerifyCredential(id) => service::verify_credential(stub, &id).await.into(),
            GetCredential(id) => service::get_credential(stub, &id).await.into(),
            ListCredentials(filter) => service::list_credentials(stub, &filter).await.into(),
            RevokeCredential { id, issuer, reason } => {
                service::revoke_credential(stub, &id, &issuer, &reason)
                    .await
                    .into()
            }
            RequestVerification(request) => {
                service::request_verification(stub, request).await.into()
            }
            RespondToVerification {
                id,
                decision,
                result,
            } => service::respond_to_verification(stub, &id, decision, result)
                .await
                .into(),
            GetVerificationRequest(id) => {
                service::get_verification_request(stub, &id).await.into()
            }
            ListVerificationRequests(filter) => {
                service::list_verification_requests(stub, &filter)
                    .await
                    .into()
            }
            CheckRevocationStatus(id) => {
                service::check_revocation_status(stub, &id).await.into()
            }
            ListRevocations => service::list_revocations(stub).await.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::credential_digest;
    use crate::domain::keys;
    use cc_shim::{ErrorKind, LedgerHarness};
    use chrono::Duration;

    const CLAIMS: &str = r#"{"degree":"BSc","year":2023}"#;

    async fn ready() -> (LedgerHarness, IdentityVerification) {
        let harness = LedgerHarness::default();
        let cc = IdentityVerification;
        assert!(harness.init(&cc, &[]).await.is_success());
        for (id, kind) in [("uni", "university"), ("alice", "person"), ("bank", "company")] {
            let created = harness
                .invoke(&cc, "createIdentity", &[id, "pk", kind, "org"])
                .await;
            assert!(created.is_success(), "{:?}", created.response);
        }
        (harness, cc)
    }

    /// Issue with a proof matching the timestamp the next transaction will carry.
    async fn issue(harness: &LedgerHarness, cc: &IdentityVerification, id: &str, days: &str) {
        let issued_at = harness.next_timestamp().timestamp();
        let proof = credential_digest(id, "academic", "uni", "alice", issued_at);
        let outcome = harness
            .invoke(
                cc,
                "issueCredential",
                &[id, "academic", "uni", "alice", CLAIMS, proof.as_str(), days],
            )
            .await;
        assert!(outcome.is_success(), "{:?}", outcome.response);
    }

    #[tokio::test]
    async fn test_init_creates_root_authority() {
        let harness = LedgerHarness::default();
        let cc = IdentityVerification;
        let outcome = harness.init(&cc, &[]).await;
        assert_eq!(outcome.json()["id"], "root-authority");
        assert!(outcome.json().get("expiresAt").is_none());
        assert!(harness.ledger().committed_value(keys::SYSTEM_CONFIG).is_some());
    }

    #[tokio::test]
    async fn test_non_authority_identity_expires_in_a_year() {
        let (harness, cc) = ready().await;
        let alice = harness.invoke(&cc, "getIdentity", &["alice"]).await.json();
        assert_eq!(
            alice["expiresAt"].as_i64().unwrap() - alice["createdAt"].as_i64().unwrap(),
            365 * 86_400
        );

        let duplicate = harness
            .invoke(&cc, "createIdentity", &["alice", "pk", "person", "org"])
            .await;
        assert_eq!(duplicate.response.kind, Some(ErrorKind::AlreadyExists));
    }

    #[tokio::test]
    async fn test_valid_credential_verifies() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "365").await;
        let result = harness.invoke(&cc, "verifyCredential", &["cred001"]).await.json();
        assert_eq!(result["valid"], true);
        assert_eq!(result["reason"], "valid");
        assert_eq!(result["details"]["subject"], "alice");
    }

    #[tokio::test]
    async fn test_expired_credential() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "-1").await;
        let result = harness.invoke(&cc, "verifyCredential", &["cred001"]).await.json();
        assert_eq!(result["valid"], false);
        assert_eq!(result["reason"], "expired");
    }

    #[tokio::test]
    async fn test_credential_expires_as_clock_moves() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "1").await;
        harness.advance_clock(Duration::days(2));
        let result = harness.invoke(&cc, "verifyCredential", &["cred001"]).await.json();
        assert_eq!(result["reason"], "expired");
    }

    #[tokio::test]
    async fn test_zero_days_never_expires() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "0").await;
        harness.advance_clock(Duration::days(1000));
        let result = harness.invoke(&cc, "verifyCredential", &["cred001"]).await.json();
        assert_eq!(result["valid"], true);
        assert_eq!(result["reason"], "valid");
    }

    #[tokio::test]
    async fn test_revocation_record_outranks_cached_status() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "-1").await;
        let revoked = harness
            .invoke(&cc, "revokeCredential", &["cred001", "uni", "fraud"])
            .await;
        assert!(revoked.is_success());

        // Put the cached status back to active behind the chaincode's back.
        let key = keys::credential("cred001").unwrap();
        let mut stored: serde_json::Value =
            serde_json::from_slice(&harness.ledger().committed_value(&key).unwrap()).unwrap();
        assert_eq!(stored["status"], "revoked");
        stored["status"] = "active".into();
        harness
            .ledger()
            .seed(key, serde_json::to_vec(&stored).unwrap());

        let result = harness.invoke(&cc, "verifyCredential", &["cred001"]).await.json();
        assert_eq!(result["valid"], false);
        assert_eq!(result["reason"], "revoked");

        let status = harness
            .invoke(&cc, "checkRevocationStatus", &["cred001"])
            .await
            .json();
        assert_eq!(status["revoked"], true);
    }

    #[tokio::test]
    async fn test_only_issuer_revokes_once() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "365").await;
        let wrong = harness
            .invoke(&cc, "revokeCredential", &["cred001", "bank", "nope"])
            .await;
        assert_eq!(wrong.response.kind, Some(ErrorKind::FailedPrecondition));

        harness
            .invoke(&cc, "revokeCredential", &["cred001", "uni", "fraud"])
            .await;
        let again = harness
            .invoke(&cc, "revokeCredential", &["cred001", "uni", "fraud"])
            .await;
        assert_eq!(again.response.kind, Some(ErrorKind::FailedPrecondition));

        let records = harness.invoke(&cc, "listRevocations", &[]).await.json();
        assert_eq!(records.as_array().unwrap().len(), 1);
        assert_eq!(records[0]["credentialID"], "cred001");
    }

    #[tokio::test]
    async fn test_inactive_issuer_and_bad_proof() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "365").await;
        let forged = harness
            .invoke(
                &cc,
                "issueCredential",
                &["cred002", "academic", "uni", "alice", CLAIMS, "not-a-digest"],
            )
            .await;
        assert!(forged.is_success());
        let result = harness.invoke(&cc, "verifyCredential", &["cred002"]).await.json();
        assert_eq!(result["reason"], "invalid_proof");

        harness.invoke(&cc, "revokeIdentity", &["uni", "closed"]).await;
        let result = harness.invoke(&cc, "verifyCredential", &["cred001"]).await.json();
        assert_eq!(result["reason"], "issuer_inactive");

        let blocked = harness
            .invoke(
                &cc,
                "issueCredential",
                &["cred003", "academic", "uni", "alice", CLAIMS, "x"],
            )
            .await;
        assert_eq!(blocked.response.kind, Some(ErrorKind::FailedPrecondition));
    }

    #[tokio::test]
    async fn test_issue_requires_known_parties() {
        let (harness, cc) = ready().await;
        let outcome = harness
            .invoke(
                &cc,
                "issueCredential",
                &["cred001", "academic", "uni", "nobody", CLAIMS, "x"],
            )
            .await;
        assert_eq!(outcome.response.kind, Some(ErrorKind::NotFound));
        assert!(outcome.response.message.contains("Subject identity"));
    }

    #[tokio::test]
    async fn test_list_credentials_filters() {
        let (harness, cc) = ready().await;
        issue(&harness, &cc, "cred001", "365").await;
        issue(&harness, &cc, "cred002", "365").await;
        harness
            .invoke(
                &cc,
                "issueCredential",
                &["cred003", "professional", "bank", "uni", "{}", "x"],
            )
            .await;

        let by_subject = harness.invoke(&cc, "listCredentials", &["alice"]).await.json();
        assert_eq!(by_subject.as_array().unwrap().len(), 2);
        let by_issuer = harness.invoke(&cc, "listCredentials", &["", "bank"]).await.json();
        assert_eq!(by_issuer[0]["id"], "cred003");
        let by_type = harness
            .invoke(&cc, "listCredentials", &["", "", "professional"])
            .await
            .json();
        assert_eq!(by_type.as_array().unwrap().len(), 1);
        let none = harness
            .invoke(&cc, "listCredentials", &["alice", "bank"])
            .await
            .json();
        assert!(none.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verification_request_flow() {
        let (harness, cc) = ready().await;
        let created = harness
            .invoke(
                &cc,
                "requestVerification",
                &["req1", "bank", "alice", "cred001", "loan"],
            )
            .await;
        assert_eq!(created.json()["status"], "pending");

        let answered = harness
            .invoke(
                &cc,
                "respondToVerification",
                &["req1", "approved", r#"{"score":9}"#],
            )
            .await;
        assert_eq!(answered.json()["status"], "approved");
        assert_eq!(answered.json()["result"]["score"], 9);

        let twice = harness
            .invoke(&cc, "respondToVerification", &["req1", "denied", "{}"])
            .await;
        assert_eq!(twice.response.kind, Some(ErrorKind::FailedPrecondition));

        let listed = harness
            .invoke(&cc, "listVerificationRequests", &["bank", "", "approved"])
            .await
            .json();
        assert_eq!(listed.as_array().unwrap().len(), 1);
        let pending = harness
            .invoke(&cc, "listVerificationRequests", &["", "", "pending"])
            .await
            .json();
        assert!(pending.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_identities_by_type() {
        let (harness, cc) = ready().await;
        let authorities = harness
            .invoke(&cc, "listIdentities", &["authority"])
            .await
            .json();
        assert_eq!(authorities[0]["id"], "root-authority");
        let all = harness.invoke(&cc, "listIdentities", &[]).await.json();
        assert_eq!(all.as_array().unwrap().len(), 4);
    }
}
