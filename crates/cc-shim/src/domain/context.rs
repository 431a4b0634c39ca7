//! Transaction context and invocation descriptor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable per-invocation tuple resolved from the node once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionContext {
    pub transaction_id: String,
    pub channel_id: String,
    pub creator: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

impl TransactionContext {
    /// Nanoseconds since the Unix epoch, saturating outside the representable range.
    pub fn timestamp_nanos(&self) -> i64 {
        self.timestamp
            .timestamp_nanos_opt()
            .unwrap_or(if self.timestamp.timestamp() < 0 {
                i64::MIN
            } else {
                i64::MAX
            })
    }

    pub fn timestamp_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

/// Which chaincode entry point an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    Init,
    Invoke,
}

/// Function name used when the environment supplies none.
pub const DEFAULT_FUNCTION: &str = "invoke";

/// Reserved function name selecting Init mode.
pub const INIT_FUNCTION: &str = "init";

/// Function name and positional arguments of one invocation.
///
/// Built from the process environment before any RPC, so it stays available
/// when the node is unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: InvocationMode,
    pub function: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Mode is `Init` exactly when the function is `init`; an empty function
    /// falls back to `invoke`.
    pub fn new(function: impl Into<String>, args: Vec<String>) -> Self {
        let mut function = function.into();
        if function.is_empty() {
            function = DEFAULT_FUNCTION.to_string();
        }
        let mode = if function == INIT_FUNCTION {
            InvocationMode::Init
        } else {
            InvocationMode::Invoke
        };
        Self {
            mode,
            function,
            args,
        }
    }

    pub fn init(args: Vec<String>) -> Self {
        Self::new(INIT_FUNCTION, args)
    }

    pub fn invoke<S: Into<String>>(function: &str, args: impl IntoIterator<Item = S>) -> Self {
        Self::new(function, args.into_iter().map(Into::into).collect())
    }
}
