//! # Chaincode Stub
//!
//! The object a chaincode function receives. Every ledger access,
//! transaction-metadata lookup, event and log line goes through it, each as
//! one RPC bounded by its own deadline: the point timeout for single-key
//! operations and context lookups, the range timeout for scans.
//!
//! Failures are returned, never swallowed, and never retried. The one
//! exception is [`ChaincodeStub::log_message`], which is best-effort.
//!
//! Invocation data (function name and arguments) is resolved from the
//! environment before any network call, so it stays readable when the node
//! is down.

use crate::config::ShimConfig;
use crate::domain::composite_key;
use crate::domain::{Invocation, InvocationMode, KeyValue, StateQueryIterator, TransactionContext};
use crate::errors::{ShimError, ShimResult};
use crate::ports::outbound::{methods, CompositeKeyQuery, LedgerTransport, LogLevel, RangeQuery};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Client-side proxy for one invocation's ledger access.
pub struct ChaincodeStub {
    transport: Arc<dyn LedgerTransport>,
    invocation: Invocation,
    point_timeout: Duration,
    range_timeout: Duration,
    page_size: u32,
    preassigned_tx_id: Option<String>,
    context: OnceCell<TransactionContext>,
    record_sequence: AtomicU32,
}

impl ChaincodeStub {
    pub fn new(
        transport: Arc<dyn LedgerTransport>,
        invocation: Invocation,
        config: &ShimConfig,
    ) -> Self {
        Self {
            transport,
            invocation,
            point_timeout: config.point_timeout,
            range_timeout: config.range_timeout,
            page_size: config.page_size,
            preassigned_tx_id: config.transaction_id.clone(),
            context: OnceCell::new(),
            record_sequence: AtomicU32::new(0),
        }
    }

    // =========================================================================
    // STATE ACCESS
    // =========================================================================

    /// Read `key`. `Ok(None)` means the key does not exist.
    pub async fn get_state(&self, key: &str) -> ShimResult<Option<Vec<u8>>> {
        validate_key(key)?;
        let value = self
            .point(methods::GET_STATE, self.transport.get_state(key))
            .await?;
        tracing::trace!(key, found = value.is_some(), "GetState");
        Ok(value)
    }

    /// Unconditional upsert.
    pub async fn put_state(&self, key: &str, value: &[u8]) -> ShimResult<()> {
        validate_key(key)?;
        self.point(methods::PUT_STATE, self.transport.put_state(key, value))
            .await?;
        tracing::trace!(key, len = value.len(), "PutState");
        Ok(())
    }

    /// Unconditional delete. Deleting a missing key is left to the node.
    pub async fn del_state(&self, key: &str) -> ShimResult<()> {
        validate_key(key)?;
        self.point(methods::DELETE_STATE, self.transport.delete_state(key))
            .await?;
        tracing::trace!(key, "DelState");
        Ok(())
    }

    /// Read and JSON-decode `key`.
    pub async fn get_state_json<T: DeserializeOwned>(&self, key: &str) -> ShimResult<Option<T>> {
        match self.get_state(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| ShimError::Serialization(format!("value at {key:?}: {e}"))),
            None => Ok(None),
        }
    }

    /// JSON-encode `value` and write it under `key`.
    pub async fn put_state_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> ShimResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.put_state(key, &bytes).await
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// One page of keys in `[start_key, end_key)`; an empty `end_key` is unbounded.
    pub async fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> ShimResult<StateQueryIterator> {
        self.get_state_by_range_with_bookmark(start_key, end_key, None)
            .await
    }

    /// Like [`Self::get_state_by_range`], resuming after `bookmark`.
    pub async fn get_state_by_range_with_bookmark(
        &self,
        start_key: &str,
        end_key: &str,
        bookmark: Option<&str>,
    ) -> ShimResult<StateQueryIterator> {
        if !end_key.is_empty() && end_key < start_key {
            return Err(ShimError::InvalidArgument(format!(
                "end key {end_key:?} sorts before start key {start_key:?}"
            )));
        }
        let query = RangeQuery {
            start_key: start_key.to_string(),
            end_key: end_key.to_string(),
            page_size: self.page_size,
            bookmark: bookmark.map(str::to_string),
        };
        let page = self
            .ranged(
                methods::GET_STATE_BY_RANGE,
                self.transport.get_state_by_range(&query),
            )
            .await?;
        tracing::trace!(start_key, end_key, results = page.results.len(), has_more = page.has_more, "GetStateByRange");
        Ok(StateQueryIterator::from_page(page))
    }

    /// Every key in the range, following bookmarks until the node reports no more.
    pub async fn get_state_by_range_all(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> ShimResult<Vec<KeyValue>> {
        let mut all = Vec::new();
        let mut bookmark: Option<String> = None;
        loop {
            let mut iter = self
                .get_state_by_range_with_bookmark(start_key, end_key, bookmark.as_deref())
                .await?;
            all.extend(iter.collect_remaining()?);
            match next_bookmark(methods::GET_STATE_BY_RANGE, &iter, bookmark.as_deref())? {
                Some(next) => bookmark = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// One page of keys under the composite prefix `object_type` + `keys`.
    pub async fn get_state_by_partial_composite_key<S: AsRef<str>>(
        &self,
        object_type: &str,
        keys: &[S],
    ) -> ShimResult<StateQueryIterator> {
        self.get_state_by_partial_composite_key_with_bookmark(object_type, keys, None)
            .await
    }

    /// Like [`Self::get_state_by_partial_composite_key`], resuming after `bookmark`.
    pub async fn get_state_by_partial_composite_key_with_bookmark<S: AsRef<str>>(
        &self,
        object_type: &str,
        keys: &[S],
        bookmark: Option<&str>,
    ) -> ShimResult<StateQueryIterator> {
        // Rejects an empty type or a delimiter before the RPC.
        composite_key::create_composite_key(object_type, keys)?;
        let query = CompositeKeyQuery {
            object_type: object_type.to_string(),
            keys: keys.iter().map(|k| k.as_ref().to_string()).collect(),
            page_size: self.page_size,
            bookmark: bookmark.map(str::to_string),
        };
        let page = self
            .ranged(
                methods::GET_STATE_BY_PARTIAL_COMPOSITE_KEY,
                self.transport.get_state_by_partial_composite_key(&query),
            )
            .await?;
        tracing::trace!(object_type, results = page.results.len(), has_more = page.has_more, "GetStateByPartialCompositeKey");
        Ok(StateQueryIterator::from_page(page))
    }

    /// Every key under the composite prefix, across pages.
    pub async fn get_state_by_partial_composite_key_all<S: AsRef<str>>(
        &self,
        object_type: &str,
        keys: &[S],
    ) -> ShimResult<Vec<KeyValue>> {
        let mut all = Vec::new();
        let mut bookmark: Option<String> = None;
        loop {
            let mut iter = self
                .get_state_by_partial_composite_key_with_bookmark(
                    object_type,
                    keys,
                    bookmark.as_deref(),
                )
                .await?;
            all.extend(iter.collect_remaining()?);
            match next_bookmark(
                methods::GET_STATE_BY_PARTIAL_COMPOSITE_KEY,
                &iter,
                bookmark.as_deref(),
            )? {
                Some(next) => bookmark = Some(next),
                None => return Ok(all),
            }
        }
    }

    /// Decode every record stored under the composite prefix `object_type` + `keys`.
    pub async fn get_composite_json<T: DeserializeOwned, S: AsRef<str>>(
        &self,
        object_type: &str,
        keys: &[S],
    ) -> ShimResult<Vec<T>> {
        self.get_state_by_partial_composite_key_all(object_type, keys)
            .await?
            .iter()
            .map(KeyValue::decode)
            .collect()
    }

    /// Follow secondary-index entries to their primary records.
    ///
    /// Index keys are `index_type \0 attrs... \0 id`; the record lives at
    /// `primary_type \0 id`. Entries whose record is gone are skipped.
    pub async fn get_indexed_json<T: DeserializeOwned, S: AsRef<str>>(
        &self,
        index_type: &str,
        attrs: &[S],
        primary_type: &str,
    ) -> ShimResult<Vec<T>> {
        let entries = self
            .get_state_by_partial_composite_key_all(index_type, attrs)
            .await?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let (_, index_attrs) = composite_key::split_composite_key(&entry.key)?;
            let id = index_attrs.last().ok_or_else(|| {
                ShimError::InvalidFormat(format!("index key {:?} has no record id", entry.key))
            })?;
            let primary = composite_key::create_composite_key(primary_type, &[id])?;
            match self.get_state_json(&primary).await? {
                Some(record) => records.push(record),
                None => tracing::warn!(index = index_type, id = %id, "Dangling index entry"),
            }
        }
        Ok(records)
    }

    pub fn create_composite_key<S: AsRef<str>>(
        &self,
        object_type: &str,
        attributes: &[S],
    ) -> ShimResult<String> {
        composite_key::create_composite_key(object_type, attributes)
    }

    pub fn split_composite_key(&self, key: &str) -> ShimResult<(String, Vec<String>)> {
        composite_key::split_composite_key(key)
    }

    // =========================================================================
    // TRANSACTION CONTEXT
    // =========================================================================

    /// Resolve the transaction context on first use; later calls are free.
    pub async fn transaction_context(&self) -> ShimResult<&TransactionContext> {
        self.context
            .get_or_try_init(|| async {
                let transaction_id = match &self.preassigned_tx_id {
                    Some(id) => id.clone(),
                    None => {
                        self.point(
                            methods::GET_TRANSACTION_ID,
                            self.transport.get_transaction_id(),
                        )
                        .await?
                    }
                };
                let channel_id = self
                    .point(methods::GET_CHANNEL_ID, self.transport.get_channel_id())
                    .await?;
                let creator = self
                    .point(methods::GET_CREATOR, self.transport.get_creator())
                    .await?;
                let timestamp = self
                    .point(
                        methods::GET_TRANSACTION_TIMESTAMP,
                        self.transport.get_transaction_timestamp(),
                    )
                    .await?;
                tracing::debug!(tx_id = %transaction_id, channel = %channel_id, "Transaction context resolved");
                Ok::<_, ShimError>(TransactionContext {
                    transaction_id,
                    channel_id,
                    creator,
                    timestamp,
                })
            })
            .await
    }

    pub async fn get_tx_id(&self) -> ShimResult<&str> {
        Ok(&self.transaction_context().await?.transaction_id)
    }

    pub async fn get_channel_id(&self) -> ShimResult<&str> {
        Ok(&self.transaction_context().await?.channel_id)
    }

    pub async fn get_creator(&self) -> ShimResult<&[u8]> {
        Ok(&self.transaction_context().await?.creator)
    }

    /// Timestamp assigned to the transaction by the node. Chaincode uses this
    /// rather than the wall clock so re-executing nodes write equal values.
    pub async fn get_tx_timestamp(&self) -> ShimResult<DateTime<Utc>> {
        Ok(self.transaction_context().await?.timestamp)
    }

    /// Id for an append-only record: `<20-digit nanos>-<tx id>-<6-digit sequence>`.
    ///
    /// Unique across concurrent transactions (tx id) and within one (sequence),
    /// and sorts by transaction time.
    pub async fn unique_record_id(&self) -> ShimResult<String> {
        let context = self.transaction_context().await?;
        let sequence = self.record_sequence.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "{:020}-{}-{:06}",
            context.timestamp_nanos().max(0),
            context.transaction_id,
            sequence
        ))
    }

    // =========================================================================
    // EVENTS AND LOGGING
    // =========================================================================

    /// Attach an event to the transaction result. Setting the same name twice
    /// in one transaction keeps the last payload.
    pub async fn set_event(&self, name: &str, payload: &[u8]) -> ShimResult<()> {
        if name.is_empty() {
            return Err(ShimError::InvalidArgument(
                "event name cannot be empty".to_string(),
            ));
        }
        self.point(methods::SET_EVENT, self.transport.set_event(name, payload))
            .await?;
        tracing::debug!(event = name, "SetEvent");
        Ok(())
    }

    /// JSON-encode `payload` and attach it as event `name`.
    pub async fn set_event_json<T: Serialize + ?Sized>(&self, name: &str, payload: &T) -> ShimResult<()> {
        let bytes = serde_json::to_vec(payload)?;
        self.set_event(name, &bytes).await
    }

    /// Forward a diagnostic to the node. Best-effort: failures are logged
    /// locally and never reach the caller.
    pub async fn log_message(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(function = %self.invocation.function, "{message}"),
            LogLevel::Info => tracing::info!(function = %self.invocation.function, "{message}"),
            LogLevel::Warn => tracing::warn!(function = %self.invocation.function, "{message}"),
            LogLevel::Error => tracing::error!(function = %self.invocation.function, "{message}"),
        }
        if let Err(e) = self
            .point(
                methods::LOG_MESSAGE,
                self.transport.log_message(level, message),
            )
            .await
        {
            tracing::warn!(error = %e, "LogMessage not delivered");
        }
    }

    // =========================================================================
    // INVOCATION
    // =========================================================================

    pub fn get_function_and_parameters(&self) -> (&str, &[String]) {
        (&self.invocation.function, &self.invocation.args)
    }

    pub fn get_string_args(&self) -> &[String] {
        &self.invocation.args
    }

    pub fn get_args(&self) -> Vec<Vec<u8>> {
        self.invocation
            .args
            .iter()
            .map(|arg| arg.as_bytes().to_vec())
            .collect()
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub fn mode(&self) -> InvocationMode {
        self.invocation.mode
    }

    // =========================================================================
    // DEADLINES
    // =========================================================================

    async fn point<T>(
        &self,
        method: &'static str,
        call: impl Future<Output = ShimResult<T>>,
    ) -> ShimResult<T> {
        with_deadline(method, self.point_timeout, call).await
    }

    async fn ranged<T>(
        &self,
        method: &'static str,
        call: impl Future<Output = ShimResult<T>>,
    ) -> ShimResult<T> {
        with_deadline(method, self.range_timeout, call).await
    }
}

async fn with_deadline<T>(
    method: &'static str,
    timeout: Duration,
    call: impl Future<Output = ShimResult<T>>,
) -> ShimResult<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ShimError::Timeout {
            method,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

fn validate_key(key: &str) -> ShimResult<()> {
    if key.is_empty() {
        return Err(ShimError::InvalidArgument("key cannot be empty".to_string()));
    }
    Ok(())
}

/// Bookmark for the follow-up page, or `None` when the scan is complete.
/// A node that claims more results without advancing the bookmark would
/// loop forever, so that is a protocol error.
fn next_bookmark(
    method: &'static str,
    iter: &StateQueryIterator,
    previous: Option<&str>,
) -> ShimResult<Option<String>> {
    if !iter.has_more_pages() {
        return Ok(None);
    }
    match iter.bookmark() {
        Some(next) if Some(next) != previous => Ok(Some(next.to_string())),
        _ => Err(ShimError::Protocol {
            method,
            code: crate::errors::codes::CLIENT_ERROR,
            message: "node reported more results without advancing the bookmark".to_string(),
        }),
    }
}
