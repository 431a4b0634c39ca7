pub mod entities;
pub mod keys;
pub mod proof;

pub use entities::{
    Attributes, Credential, CredentialStatus, Identity, IdentityConfig, IdentityStatus, Proof,
    RevocationRecord, VerificationRequest, VerificationStatus,
};
pub use proof::{credential_digest, VerificationOutcome, VerificationReason};
