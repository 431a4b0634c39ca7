//! The value every chaincode function returns.

use crate::errors::{ChaincodeError, ErrorKind, UNCLASSIFIED_EXIT_CODE};
use serde::{Deserialize, Serialize};

/// HTTP-style status conventions. No HTTP exchange is implied.
pub mod status {
    pub const OK: i32 = 200;
    pub const ERROR: i32 = 500;
}

/// Outcome of an Init/Invoke call. Only `status == OK` lets the node commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, with = "hex_bytes", skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl Response {
    pub fn success(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            status: status::OK,
            message: String::new(),
            payload: payload.into(),
            kind: None,
        }
    }

    /// Untyped failure, kept for chaincode that does not classify its errors.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: status::ERROR,
            message: message.into(),
            payload: Vec::new(),
            kind: None,
        }
    }

    pub fn error_with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            ..Self::error(message)
        }
    }

    /// Success carrying `value` serialized as JSON.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(payload) => Self::success(payload),
            Err(e) => Self::error_with_kind(
                ErrorKind::Validation,
                format!("failed to encode response payload: {e}"),
            ),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == status::OK
    }

    /// Process exit code: 0 on success, the kind's code otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            0
        } else {
            self.kind
                .map(|k| k.exit_code())
                .unwrap_or(UNCLASSIFIED_EXIT_CODE)
        }
    }

    /// Summary line printed on stdout. JSON payloads are inlined, anything
    /// else is shown hex-encoded.
    pub fn summary_json(&self) -> serde_json::Value {
        let payload = if self.payload.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&self.payload)
                .unwrap_or_else(|_| serde_json::Value::String(hex::encode(&self.payload)))
        };
        serde_json::json!({
            "status": self.status,
            "message": self.message,
            "kind": self.kind,
            "payload": payload,
        })
    }
}

impl From<ChaincodeError> for Response {
    fn from(err: ChaincodeError) -> Self {
        Response::error_with_kind(err.kind(), err.to_string())
    }
}

impl<T: Serialize> From<Result<T, ChaincodeError>> for Response {
    fn from(result: Result<T, ChaincodeError>) -> Self {
        match result {
            Ok(value) => Response::json(&value),
            Err(err) => err.into(),
        }
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
