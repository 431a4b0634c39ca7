//! # Outbound Ports (Driven Ports)
//!
//! The ledger-facing RPC surface the stub depends on. One method per node
//! call; no streaming, no retry. Implementations must map connection
//! failures to [`ShimError::Transport`] and node-side refusals to
//! [`ShimError::Protocol`], [`ShimError::WriteRejected`] or
//! [`ShimError::EventRejected`].

use crate::domain::QueryPage;
use crate::errors::ShimResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Method names of the node's shim service.
pub mod methods {
    pub const GET_STATE: &str = "shim_getState";
    pub const PUT_STATE: &str = "shim_putState";
    pub const DELETE_STATE: &str = "shim_deleteState";
    pub const GET_STATE_BY_RANGE: &str = "shim_getStateByRange";
    pub const GET_STATE_BY_PARTIAL_COMPOSITE_KEY: &str = "shim_getStateByPartialCompositeKey";
    pub const GET_TRANSACTION_ID: &str = "shim_getTransactionId";
    pub const GET_CHANNEL_ID: &str = "shim_getChannelId";
    pub const GET_CREATOR: &str = "shim_getCreator";
    pub const GET_TRANSACTION_TIMESTAMP: &str = "shim_getTransactionTimestamp";
    pub const SET_EVENT: &str = "shim_setEvent";
    pub const LOG_MESSAGE: &str = "shim_logMessage";
}

/// Range scan request. Start inclusive, end exclusive; empty end is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeQuery {
    pub start_key: String,
    pub end_key: String,
    /// Requested page size; 0 lets the node choose.
    pub page_size: u32,
    /// Resume strictly after this key.
    pub bookmark: Option<String>,
}

/// Partial composite key scan request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeKeyQuery {
    pub object_type: String,
    pub keys: Vec<String>,
    pub page_size: u32,
    pub bookmark: Option<String>,
}

/// Severity of a chaincode diagnostic forwarded to the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node's shim service as seen from one invocation.
#[async_trait::async_trait]
pub trait LedgerTransport: Send + Sync {
    /// `Ok(None)` when the key was never written or is deleted.
    async fn get_state(&self, key: &str) -> ShimResult<Option<Vec<u8>>>;

    async fn put_state(&self, key: &str, value: &[u8]) -> ShimResult<()>;

    /// Deleting a missing key is not an error at this layer.
    async fn delete_state(&self, key: &str) -> ShimResult<()>;

    async fn get_state_by_range(&self, query: &RangeQuery) -> ShimResult<QueryPage>;

    async fn get_state_by_partial_composite_key(
        &self,
        query: &CompositeKeyQuery,
    ) -> ShimResult<QueryPage>;

    async fn get_transaction_id(&self) -> ShimResult<String>;

    async fn get_channel_id(&self) -> ShimResult<String>;

    async fn get_creator(&self) -> ShimResult<Vec<u8>>;

    async fn get_transaction_timestamp(&self) -> ShimResult<DateTime<Utc>>;

    async fn set_event(&self, name: &str, payload: &[u8]) -> ShimResult<()>;

    async fn log_message(&self, level: LogLevel, message: &str) -> ShimResult<()>;

    /// Release the connection. Called exactly once by the dispatcher.
    async fn close(&self) -> ShimResult<()> {
        Ok(())
    }
}
