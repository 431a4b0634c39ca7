//! Invoke functions parsed into a typed command.

use crate::domain::entities::DEFAULT_VALIDITY_DAYS;
use crate::domain::{Attributes, VerificationStatus};
use cc_shim::domain::args::{
    expect_args, expect_args_range, key_value_pairs, optional_arg, parse_i64, parse_json,
    require_non_empty,
};
use cc_shim::ChaincodeError;

/// Most attribute pairs one `updateIdentity` call may carry.
pub const MAX_ATTRIBUTE_PAIRS: usize = 9;

/// Filters for `listCredentials`. Empty arguments mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialFilter {
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub credential_type: Option<String>,
}

/// Filters for `listVerificationRequests`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationFilter {
    pub requester: Option<String>,
    pub subject: Option<String>,
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCredential {
    pub id: String,
    pub credential_type: String,
    pub issuer: String,
    pub subject: String,
    pub claims: Attributes,
    pub proof_value: String,
    pub expiration_days: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestVerification {
    pub id: String,
    pub requester: String,
    pub subject: String,
    pub credential: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityCommand {
    CreateIdentity {
        id: String,
        public_key: String,
        identity_type: String,
        organization: String,
    },
    UpdateIdentity {
        id: String,
        attributes: Vec<(String, String)>,
    },
    GetIdentity(String),
    ListIdentities {
        identity_type: Option<String>,
    },
    RevokeIdentity {
        id: String,
        reason: String,
    },
    IssueCredential(IssueCredential),
    VerifyCredential(String),
    GetCredential(String),
    ListCredentials(CredentialFilter),
    RevokeCredential {
        id: String,
        issuer: String,
        reason: String,
    },
    RequestVerification(RequestVerification),
    RespondToVerification {
        id: String,
        decision: VerificationStatus,
        result: Attributes,
    },
    GetVerificationRequest(String),
    ListVerificationRequests(VerificationFilter),
    CheckRevocationStatus(String),
    ListRevocations,
}

fn owned(args: &[String], index: usize) -> Option<String> {
    optional_arg(args, index).map(str::to_string)
}

fn single(function: &str, args: &[String]) -> Result<String, ChaincodeError> {
    expect_args(function, args, 1)?;
    Ok(args[0].clone())
}

impl IdentityCommand {
    pub fn parse(function: &str, args: &[String]) -> Result<Self, ChaincodeError> {
        let command = match function {
            "createIdentity" => {
                expect_args(function, args, 4)?;
                require_non_empty("identity id", &args[0])?;
                require_non_empty("identity type", &args[2])?;
                IdentityCommand::CreateIdentity {
                    id: args[0].clone(),
                    public_key: args[1].clone(),
                    identity_type: args[2].clone(),
                    organization: args[3].clone(),
                }
            }
            "updateIdentity" => {
                expect_args_range(function, args, 3, 1 + 2 * MAX_ATTRIBUTE_PAIRS)?;
                IdentityCommand::UpdateIdentity {
                    id: args[0].clone(),
                    attributes: key_value_pairs(&args[1..])?,
                }
            }
            "getIdentity" => IdentityCommand::GetIdentity(single(function, args)?),
            "listIdentities" => {
                expect_args_range(function, args, 0, 1)?;
                IdentityCommand::ListIdentities {
                    identity_type: owned(args, 0),
                }
            }
            "revokeIdentity" => {
                expect_args(function, args, 2)?;
                IdentityCommand::RevokeIdentity {
                    id: args[0].clone(),
                    reason: args[1].clone(),
                }
            }
            "issueCredential" => {
                expect_args_range(function, args, 6, 7)?;
                require_non_empty("credential id", &args[0])?;
                let expiration_days = match optional_arg(args, 6) {
                    Some(days) => parse_i64("expiration days", days)?,
                    None => DEFAULT_VALIDITY_DAYS,
                };
                IdentityCommand::IssueCredential(IssueCredential {
                    id: args[0].clone(),
                    credential_type: args[1].clone(),
                    issuer: args[2].clone(),
                    subject: args[3].clone(),
                    claims: parse_json("claims", &args[4])?,
                    proof_value: args[5].clone(),
                    expiration_days,
                })
            }
            "verifyCredential" => IdentityCommand::VerifyCredential(single(function, args)?),
            "getCredential" => IdentityCommand::GetCredential(single(function, args)?),
            "listCredentials" => {
                expect_args_range(function, args, 0, 3)?;
                IdentityCommand::ListCredentials(CredentialFilter {
                    subject: owned(args, 0),
                    issuer: owned(args, 1),
                    credential_type: owned(args, 2),
                })
            }
            "revokeCredential" => {
                expect_args(function, args, 3)?;
                IdentityCommand::RevokeCredential {
                    id: args[0].clone(),
                    issuer: args[1].clone(),
                    reason: args[2].clone(),
                }
            }
            "requestVerification" => {
                expect_args(function, args, 5)?;
                require_non_empty("request id", &args[0])?;
                IdentityCommand::RequestVerification(RequestVerification {
                    id: args[0].clone(),
                    requester: args[1].clone(),
                    subject: args[2].clone(),
                    credential: args[3].clone(),
                    purpose: args[4].clone(),
                })
            }
            "respondToVerification" => {
                expect_args(function, args, 3)?;
                let decision = match args[1].as_str() {
                    "approved" => VerificationStatus::Approved,
                    "denied" => VerificationStatus::Denied,
                    other => {
                        return Err(ChaincodeError::validation(format!(
                            "response must be approved or denied, got {other:?}"
                        )))
                    }
                };
                IdentityCommand::RespondToVerification {
                    id: args[0].clone(),
                    decision,
                    result: parse_json("result", &args[2])?,
                }
            }
            "getVerificationRequest" => {
                IdentityCommand::GetVerificationRequest(single(function, args)?)
            }
            "listVerificationRequests" => {
                expect_args_range(function, args, 0, 3)?;
                let status = optional_arg(args, 2)
                    .map(str::parse::<VerificationStatus>)
                    .transpose()
                    .map_err(ChaincodeError::Validation)?;
                IdentityCommand::ListVerificationRequests(VerificationFilter {
                    requester: owned(args, 0),
                    subject: owned(args, 1),
                    status,
                })
            }
            "checkRevocationStatus" => {
                IdentityCommand::CheckRevocationStatus(single(function, args)?)
            }
            "listRevocations" => {
                expect_args(function, args, 0)?;
                IdentityCommand::ListRevocations
            }
            other => {
                return Err(ChaincodeError::validation(format!(
                    "Unknown function: {other}"
                )))
            }
        };
        Ok(command)
    }
}
