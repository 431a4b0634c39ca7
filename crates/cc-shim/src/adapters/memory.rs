//! In-memory ledger.
//!
//! A versioned key/value store that plays the node's side of the shim
//! protocol: committed state plus one pending transaction whose write set is
//! overlaid on reads (read-your-writes) until it is committed or rolled back.
//! Backs unit tests, the integration harness and the dev node.

use crate::domain::composite_key::partial_key_range;
use crate::domain::{KeyValue, QueryPage};
use crate::errors::{codes, ShimError, ShimResult};
use crate::ports::outbound::{methods, CompositeKeyQuery, LedgerTransport, LogLevel, RangeQuery};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

/// Largest page the ledger hands out when the caller does not ask for less.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Parameters of a transaction opened on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSpec {
    pub transaction_id: String,
    pub creator: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Event attached to a transaction with `SetEvent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaincodeEvent {
    pub transaction_id: String,
    pub name: String,
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

/// Diagnostic forwarded by chaincode with `LogMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub transaction_id: Option<String>,
}

/// Result of committing the pending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitSummary {
    pub transaction_id: String,
    pub writes: usize,
    pub deletes: usize,
    pub events: Vec<ChaincodeEvent>,
}

#[derive(Debug)]
struct PendingTransaction {
    spec: TransactionSpec,
    /// `None` marks a delete.
    writes: BTreeMap<String, Option<Vec<u8>>>,
    events: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    committed: BTreeMap<String, Vec<u8>>,
    pending: Option<PendingTransaction>,
    events: Vec<ChaincodeEvent>,
    logs: Vec<LogRecord>,
    calls: HashMap<&'static str, usize>,
    reject_writes: Option<String>,
}

impl LedgerInner {
    fn record_call(&mut self, method: &'static str) {
        *self.calls.entry(method).or_insert(0) += 1;
    }

    fn pending(&self, method: &'static str) -> ShimResult<&PendingTransaction> {
        self.pending.as_ref().ok_or_else(|| no_transaction(method))
    }

    fn pending_mut(&mut self, method: &'static str) -> ShimResult<&mut PendingTransaction> {
        self.pending.as_mut().ok_or_else(|| no_transaction(method))
    }

    fn lookup(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(pending) = &self.pending {
            if let Some(write) = pending.writes.get(key) {
                return write.clone();
            }
        }
        self.committed.get(key).cloned()
    }

    /// Committed state overlaid with the pending write set, restricted to
    /// `[start, end)`, one page at a time.
    fn scan(
        &self,
        start: &str,
        end: Option<&str>,
        bookmark: Option<&str>,
        page_size: usize,
    ) -> QueryPage {
        let lower = match bookmark {
            Some(b) if b >= start => Bound::Excluded(b.to_string()),
            _ => Bound::Included(start.to_string()),
        };
        let upper = match end {
            Some(e) => Bound::Excluded(e.to_string()),
            None => Bound::Unbounded,
        };
        if let (Bound::Excluded(l) | Bound::Included(l), Bound::Excluded(u)) = (&lower, &upper) {
            if l >= u {
                return QueryPage::default();
            }
        }

        let mut view: BTreeMap<&str, &[u8]> = self
            .committed
            .range::<String, _>((lower.clone(), upper.clone()))
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        if let Some(pending) = &self.pending {
            for (key, write) in pending.writes.range::<String, _>((lower, upper)) {
                match write {
                    Some(value) => view.insert(key.as_str(), value.as_slice()),
                    None => view.remove(key.as_str()),
                };
            }
        }

        let total = view.len();
        let results: Vec<KeyValue> = view
            .into_iter()
            .take(page_size)
            .map(|(k, v)| KeyValue::new(k, v))
            .collect();
        let has_more = total > results.len();
        let bookmark = if has_more {
            results.last().map(|kv| kv.key.clone())
        } else {
            None
        };
        QueryPage {
            results,
            has_more,
            bookmark,
        }
    }
}

fn no_transaction(method: &'static str) -> ShimError {
    ShimError::Protocol {
        method,
        code: codes::NO_TRANSACTION_CONTEXT,
        message: "no transaction in progress".to_string(),
    }
}

/// In-memory ledger serving one transaction at a time.
#[derive(Debug)]
pub struct InMemoryLedger {
    channel_id: String,
    max_page_size: u32,
    inner: RwLock<LedgerInner>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new("devnet")
    }
}

impl InMemoryLedger {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            inner: RwLock::new(LedgerInner::default()),
        }
    }

    /// Cap every page at `max_page_size` entries (0 keeps the default).
    pub fn with_max_page_size(mut self, max_page_size: u32) -> Self {
        if max_page_size > 0 {
            self.max_page_size = max_page_size;
        }
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Open a transaction. Only one may be pending at a time.
    pub fn begin_transaction(&self, spec: TransactionSpec) -> ShimResult<()> {
        let mut inner = self.inner.write();
        if let Some(pending) = &inner.pending {
            return Err(ShimError::Protocol {
                method: "dev_beginTransaction",
                code: codes::TRANSACTION_IN_PROGRESS,
                message: format!(
                    "transaction {} is still pending",
                    pending.spec.transaction_id
                ),
            });
        }
        tracing::debug!(tx_id = %spec.transaction_id, "Transaction opened");
        inner.pending = Some(PendingTransaction {
            spec,
            writes: BTreeMap::new(),
            events: BTreeMap::new(),
        });
        Ok(())
    }

    /// Apply the pending write set and publish its events.
    pub fn commit(&self) -> ShimResult<CommitSummary> {
        let mut inner = self.inner.write();
        let pending = inner
            .pending
            .take()
            .ok_or_else(|| no_transaction("dev_commit"))?;

        let transaction_id = pending.spec.transaction_id;
        let (mut writes, mut deletes) = (0, 0);
        for (key, write) in pending.writes {
            match write {
                Some(value) => {
                    inner.committed.insert(key, value);
                    writes += 1;
                }
                None => {
                    inner.committed.remove(&key);
                    deletes += 1;
                }
            }
        }
        let events: Vec<ChaincodeEvent> = pending
            .events
            .into_iter()
            .map(|(name, payload)| ChaincodeEvent {
                transaction_id: transaction_id.clone(),
                name,
                payload,
            })
            .collect();
        inner.events.extend(events.iter().cloned());

        tracing::info!(tx_id = %transaction_id, writes, deletes, events = events.len(), "Transaction committed");
        Ok(CommitSummary {
            transaction_id,
            writes,
            deletes,
            events,
        })
    }

    /// Discard the pending write set. Returns the discarded transaction id.
    pub fn rollback(&self) -> ShimResult<String> {
        let mut inner = self.inner.write();
        let pending = inner
            .pending
            .take()
            .ok_or_else(|| no_transaction("dev_rollback"))?;
        tracing::info!(tx_id = %pending.spec.transaction_id, discarded = pending.writes.len(), "Transaction rolled back");
        Ok(pending.spec.transaction_id)
    }

    pub fn has_pending_transaction(&self) -> bool {
        self.inner.read().pending.is_some()
    }

    /// Write directly to committed state, bypassing any transaction.
    pub fn seed(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.inner.write().committed.insert(key.into(), value.into());
    }

    pub fn committed_value(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.read().committed.get(key).cloned()
    }

    pub fn committed_len(&self) -> usize {
        self.inner.read().committed.len()
    }

    /// Events of every committed transaction, in commit order.
    pub fn events(&self) -> Vec<ChaincodeEvent> {
        self.inner.read().events.clone()
    }

    pub fn logs(&self) -> Vec<LogRecord> {
        self.inner.read().logs.clone()
    }

    /// Make every subsequent `PutState`/`DelState` fail with `reason`.
    pub fn reject_writes(&self, reason: Option<String>) {
        self.inner.write().reject_writes = reason;
    }

    /// How many times `method` was served.
    pub fn call_count(&self, method: &str) -> usize {
        self.inner.read().calls.get(method).copied().unwrap_or(0)
    }

    fn write(&self, method: &'static str, key: &str, value: Option<Vec<u8>>) -> ShimResult<()> {
        let mut inner = self.inner.write();
        inner.record_call(method);
        if let Some(reason) = inner.reject_writes.clone() {
            return Err(ShimError::WriteRejected {
                key: key.to_string(),
                reason,
            });
        }
        if key.is_empty() {
            return Err(ShimError::WriteRejected {
                key: String::new(),
                reason: "key cannot be empty".to_string(),
            });
        }
        let pending = inner.pending_mut(method)?;
        pending.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn effective_page_size(&self, requested: u32) -> usize {
        if requested == 0 {
            self.max_page_size as usize
        } else {
            requested.min(self.max_page_size) as usize
        }
    }
}

#[async_trait::async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn get_state(&self, key: &str) -> ShimResult<Option<Vec<u8>>> {
        let mut inner = self.inner.write();
        inner.record_call(methods::GET_STATE);
        Ok(inner.lookup(key))
    }

    async fn put_state(&self, key: &str, value: &[u8]) -> ShimResult<()> {
        self.write(methods::PUT_STATE, key, Some(value.to_vec()))
    }

    async fn delete_state(&self, key: &str) -> ShimResult<()> {
        self.write(methods::DELETE_STATE, key, None)
    }

    async fn get_state_by_range(&self, query: &RangeQuery) -> ShimResult<QueryPage> {
        let page_size = self.effective_page_size(query.page_size);
        let mut inner = self.inner.write();
        inner.record_call(methods::GET_STATE_BY_RANGE);
        let end = (!query.end_key.is_empty()).then_some(query.end_key.as_str());
        Ok(inner.scan(
            &query.start_key,
            end,
            query.bookmark.as_deref(),
            page_size,
        ))
    }

    async fn get_state_by_partial_composite_key(
        &self,
        query: &CompositeKeyQuery,
    ) -> ShimResult<QueryPage> {
        let page_size = self.effective_page_size(query.page_size);
        let (start, end) = partial_key_range(&query.object_type, &query.keys)?;
        let mut inner = self.inner.write();
        inner.record_call(methods::GET_STATE_BY_PARTIAL_COMPOSITE_KEY);
        Ok(inner.scan(&start, Some(&end), query.bookmark.as_deref(), page_size))
    }

    async fn get_transaction_id(&self) -> ShimResult<String> {
        let mut inner = self.inner.write();
        inner.record_call(methods::GET_TRANSACTION_ID);
        Ok(inner
            .pending(methods::GET_TRANSACTION_ID)?
            .spec
            .transaction_id
            .clone())
    }

    async fn get_channel_id(&self) -> ShimResult<String> {
        self.inner.write().record_call(methods::GET_CHANNEL_ID);
        Ok(self.channel_id.clone())
    }

    async fn get_creator(&self) -> ShimResult<Vec<u8>> {
        let mut inner = self.inner.write();
        inner.record_call(methods::GET_CREATOR);
        Ok(inner.pending(methods::GET_CREATOR)?.spec.creator.clone())
    }

    async fn get_transaction_timestamp(&self) -> ShimResult<DateTime<Utc>> {
        let mut inner = self.inner.write();
        inner.record_call(methods::GET_TRANSACTION_TIMESTAMP);
        Ok(inner.pending(methods::GET_TRANSACTION_TIMESTAMP)?.spec.timestamp)
    }

    /// Last write wins when the same name is set twice in one transaction.
    async fn set_event(&self, name: &str, payload: &[u8]) -> ShimResult<()> {
        let mut inner = self.inner.write();
        inner.record_call(methods::SET_EVENT);
        if name.is_empty() {
            return Err(ShimError::EventRejected {
                name: String::new(),
                reason: "event name cannot be empty".to_string(),
            });
        }
        let pending = inner.pending_mut(methods::SET_EVENT)?;
        pending.events.insert(name.to_string(), payload.to_vec());
        Ok(())
    }

    async fn log_message(&self, level: LogLevel, message: &str) -> ShimResult<()> {
        let mut inner = self.inner.write();
        inner.record_call(methods::LOG_MESSAGE);
        let transaction_id = inner
            .pending
            .as_ref()
            .map(|p| p.spec.transaction_id.clone());
        let tx_id = transaction_id.as_deref().unwrap_or("-");
        match level {
            LogLevel::Debug => tracing::debug!(target: "chaincode", tx_id, "{message}"),
            LogLevel::Info => tracing::info!(target: "chaincode", tx_id, "{message}"),
            LogLevel::Warn => tracing::warn!(target: "chaincode", tx_id, "{message}"),
            LogLevel::Error => tracing::error!(target: "chaincode", tx_id, "{message}"),
        }
        inner.logs.push(LogRecord {
            level,
            message: message.to_string(),
            transaction_id,
        });
        Ok(())
    }
}
