//! State query iterator over one fetched page of results.

use crate::errors::{ShimError, ShimResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One ledger entry returned by a range or partial-composite-key query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Decode the value as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> ShimResult<T> {
        serde_json::from_slice(&self.value).map_err(|e| {
            ShimError::Serialization(format!("value at {:?}: {e}", self.key))
        })
    }
}

/// A single bounded page as returned by the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPage {
    pub results: Vec<KeyValue>,
    /// The node truncated the result set at its page limit.
    pub has_more: bool,
    /// Opaque continuation token; the next query resumes strictly after it.
    pub bookmark: Option<String>,
}

/// Cursor over an already-fetched page. No RPC is issued while iterating.
#[derive(Debug, Default)]
pub struct StateQueryIterator {
    results: Vec<KeyValue>,
    cursor: usize,
    has_more: bool,
    bookmark: Option<String>,
    closed: bool,
}

impl StateQueryIterator {
    pub fn from_page(page: QueryPage) -> Self {
        Self {
            results: page.results,
            cursor: 0,
            has_more: page.has_more,
            bookmark: page.bookmark,
            closed: false,
        }
    }

    pub fn has_next(&self) -> bool {
        !self.closed && self.cursor < self.results.len()
    }

    /// Return the entry under the cursor and advance.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> ShimResult<KeyValue> {
        if !self.has_next() {
            return Err(ShimError::Exhausted);
        }
        let entry = std::mem::take(&mut self.results[self.cursor]);
        self.cursor += 1;
        Ok(entry)
    }

    /// Release the buffered page. Safe to call any number of times.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.results = Vec::new();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Entries left before exhaustion.
    pub fn remaining(&self) -> usize {
        if self.closed {
            0
        } else {
            self.results.len() - self.cursor
        }
    }

    /// The node holds further results beyond this page.
    pub fn has_more_pages(&self) -> bool {
        self.has_more
    }

    /// Continuation token to pass to the follow-up query.
    pub fn bookmark(&self) -> Option<&str> {
        self.bookmark.as_deref()
    }

    /// Drain every remaining entry and close.
    pub fn collect_remaining(&mut self) -> ShimResult<Vec<KeyValue>> {
        let mut out = Vec::with_capacity(self.remaining());
        while self.has_next() {
            out.push(self.next()?);
        }
        self.close();
        Ok(out)
    }

    /// Drain and JSON-decode every remaining value.
    pub fn decode_remaining<T: DeserializeOwned>(&mut self) -> ShimResult<Vec<T>> {
        self.collect_remaining()?
            .iter()
            .map(KeyValue::decode)
            .collect()
    }
}

impl Drop for StateQueryIterator {
    fn drop(&mut self) {
        self.close();
    }
}
