//! # Identity Verification Chaincode
//!
//! Digital identities, verifiable credentials with expiry and a proof digest,
//! verification requests between parties, and append-only credential
//! revocation.
//!
//! `verifyCredential` reports the first failing check, in order: revoked,
//! expired, issuer inactive, invalid proof. Revocation is decided from the
//! revocation records alone.

pub mod chaincode;
pub mod commands;
pub mod domain;
pub mod service;

pub use chaincode::IdentityVerification;
pub use commands::IdentityCommand;
pub use domain::{
    credential_digest, Credential, Identity, RevocationRecord, VerificationOutcome,
    VerificationReason, VerificationRequest,
};
