//! In-process ledger harness for driving chaincode in tests.
//!
//! Each call opens a transaction on an [`InMemoryLedger`], runs it through
//! the real dispatcher, then commits on success or rolls back on failure,
//! which is what a node does with the exit code. Transaction ids
//! (`tx-000001`, ...) and timestamps (one second apart) are deterministic.

use crate::adapters::memory::{CommitSummary, InMemoryLedger, TransactionSpec};
use crate::config::ShimConfig;
use crate::dispatcher::run_invocation;
use crate::domain::{Invocation, Response};
use crate::ports::Chaincode;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 2024-01-01T00:00:00Z
const DEFAULT_GENESIS_SECONDS: i64 = 1_704_067_200;

/// Result of one harness-driven invocation.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub transaction_id: String,
    pub response: Response,
    /// Present only when the transaction was committed.
    pub commit: Option<CommitSummary>,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.response.is_success()
    }

    /// Decode the response payload as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.response.payload).unwrap_or(serde_json::Value::Null)
    }
}

/// Drives invocations against a shared in-memory ledger.
pub struct LedgerHarness {
    ledger: Arc<InMemoryLedger>,
    config: ShimConfig,
    genesis: DateTime<Utc>,
    counter: AtomicU64,
    clock_offset: Mutex<Duration>,
    creator: Mutex<Vec<u8>>,
}

impl Default for LedgerHarness {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryLedger::default()))
    }
}

impl LedgerHarness {
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            ledger,
            config: ShimConfig::default(),
            genesis: Utc
                .timestamp_opt(DEFAULT_GENESIS_SECONDS, 0)
                .single()
                .unwrap_or_else(Utc::now),
            counter: AtomicU64::new(0),
            clock_offset: Mutex::new(Duration::zero()),
            creator: Mutex::new(b"harness-client".to_vec()),
        }
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// Identity presented as the creator of subsequent transactions.
    pub fn set_creator(&self, creator: impl Into<Vec<u8>>) {
        *self.creator.lock() = creator.into();
    }

    /// Move the transaction clock forward, e.g. past an expiry.
    pub fn advance_clock(&self, by: Duration) {
        *self.clock_offset.lock() += by;
    }

    /// Timestamp the next transaction will carry.
    pub fn next_timestamp(&self) -> DateTime<Utc> {
        let n = self.counter.load(Ordering::SeqCst) + 1;
        self.timestamp_for(n)
    }

    pub async fn init<C: Chaincode + ?Sized>(&self, chaincode: &C, args: &[&str]) -> Outcome {
        let invocation = Invocation::init(args.iter().map(|a| a.to_string()).collect());
        self.run(chaincode, invocation).await
    }

    pub async fn invoke<C: Chaincode + ?Sized>(
        &self,
        chaincode: &C,
        function: &str,
        args: &[&str],
    ) -> Outcome {
        self.run(chaincode, Invocation::invoke(function, args.iter().copied()))
            .await
    }

    async fn run<C: Chaincode + ?Sized>(&self, chaincode: &C, invocation: Invocation) -> Outcome {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let transaction_id = format!("tx-{n:06}");
        let spec = TransactionSpec {
            transaction_id: transaction_id.clone(),
            creator: self.creator.lock().clone(),
            timestamp: self.timestamp_for(n),
        };
        if let Err(e) = self.ledger.begin_transaction(spec) {
            return Outcome {
                transaction_id,
                response: Response::error_with_kind(e.kind(), e.to_string()),
                commit: None,
            };
        }

        let response =
            run_invocation(chaincode, self.ledger.clone(), invocation, &self.config).await;

        let commit = if response.is_success() {
            match self.ledger.commit() {
                Ok(summary) => Some(summary),
                Err(e) => {
                    return Outcome {
                        transaction_id,
                        response: Response::error_with_kind(e.kind(), e.to_string()),
                        commit: None,
                    }
                }
            }
        } else {
            // Nothing else can hold the transaction open.
            let _ = self.ledger.rollback();
            None
        };

        Outcome {
            transaction_id,
            response,
            commit,
        }
    }

    fn timestamp_for(&self, n: u64) -> DateTime<Utc> {
        let seconds = i64::try_from(n).unwrap_or(i64::MAX);
        self.genesis + Duration::seconds(seconds) + *self.clock_offset.lock()
    }
}
