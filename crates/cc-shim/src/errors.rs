//! Error taxonomy for the shim and for chaincode handlers.
//!
//! Every failure carries an [`ErrorKind`] so callers above the node can tell
//! "bad input, never retry" apart from "transport hiccup, retry later".

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable classification attached to every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input detected before any RPC was issued.
    Validation,
    /// Entity lookup missed.
    NotFound,
    /// Registry uniqueness violated.
    AlreadyExists,
    /// Entity exists but is in the wrong state (inactive, revoked, expired).
    FailedPrecondition,
    /// Connection failure or timeout talking to the node.
    Transport,
    /// The node answered but rejected the call.
    Protocol,
}

impl ErrorKind {
    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::FailedPrecondition => "failed_precondition",
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
        }
    }

    /// Only transport failures may succeed on a later attempt with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transport)
    }

    /// Process exit code reported by the dispatcher for this kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::Validation => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::AlreadyExists => 4,
            ErrorKind::FailedPrecondition => 5,
            ErrorKind::Transport => 6,
            ErrorKind::Protocol => 7,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON-RPC error codes used between the shim and the node.
pub mod codes {
    // JSON-RPC 2.0 standard errors
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Ledger errors
    pub const NO_TRANSACTION_CONTEXT: i64 = -32010;
    pub const TRANSACTION_IN_PROGRESS: i64 = -32011;

    /// Placeholder for protocol errors raised locally rather than by the node.
    pub const CLIENT_ERROR: i64 = -32000;
}

/// Exit code for an error response that carries no kind.
pub const UNCLASSIFIED_EXIT_CODE: u8 = 1;

/// Errors raised by the shim itself: codec, iterator, stub and transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShimError {
    /// Caller-supplied value rejected before any RPC.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored key or value does not have the expected shape.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// `next()` called on an iterator with no remaining entries.
    #[error("Iterator exhausted")]
    Exhausted,

    /// The node refused a `PutState`/`DelState`.
    #[error("Write rejected for key {key:?}: {reason}")]
    WriteRejected { key: String, reason: String },

    /// The node refused a `SetEvent`.
    #[error("Event {name:?} rejected: {reason}")]
    EventRejected { name: String, reason: String },

    /// The per-call deadline elapsed.
    #[error("{method} timed out after {timeout_ms}ms")]
    Timeout {
        method: &'static str,
        timeout_ms: u64,
    },

    /// Connection-level failure.
    #[error("Transport error in {method}: {message}")]
    Transport {
        method: &'static str,
        message: String,
    },

    /// The node returned a JSON-RPC error object or an unusable result.
    #[error("Protocol error in {method} (code {code}): {message}")]
    Protocol {
        method: &'static str,
        code: i64,
        message: String,
    },

    /// JSON encoding/decoding of a value failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid process configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ShimError {
    /// Classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShimError::InvalidArgument(_)
            | ShimError::InvalidFormat(_)
            | ShimError::Exhausted
            | ShimError::Serialization(_)
            | ShimError::Configuration(_) => ErrorKind::Validation,
            ShimError::WriteRejected { .. }
            | ShimError::EventRejected { .. }
            | ShimError::Protocol { .. } => ErrorKind::Protocol,
            ShimError::Timeout { .. } | ShimError::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Convenience check used by callers that implement their own retry.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<serde_json::Error> for ShimError {
    fn from(err: serde_json::Error) -> Self {
        ShimError::Serialization(err.to_string())
    }
}

/// Errors returned by chaincode handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChaincodeError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("{0}")]
    FailedPrecondition(String),

    #[error(transparent)]
    Shim(#[from] ShimError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChaincodeError {
    pub fn validation(message: impl Into<String>) -> Self {
        ChaincodeError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ChaincodeError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn already_exists(entity: &'static str, id: impl Into<String>) -> Self {
        ChaincodeError::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        ChaincodeError::FailedPrecondition(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChaincodeError::Validation(_) | ChaincodeError::Serialization(_) => {
                ErrorKind::Validation
            }
            ChaincodeError::NotFound { .. } => ErrorKind::NotFound,
            ChaincodeError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            ChaincodeError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            ChaincodeError::Shim(err) => err.kind(),
        }
    }
}

impl From<serde_json::Error> for ChaincodeError {
    fn from(err: serde_json::Error) -> Self {
        ChaincodeError::Serialization(err.to_string())
    }
}

/// Result alias for shim operations.
pub type ShimResult<T> = Result<T, ShimError>;
