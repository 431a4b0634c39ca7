//! JSON-RPC 2.0 over HTTP binding of the ledger transport.

use crate::domain::{KeyValue, QueryPage};
use crate::errors::{codes, ShimError, ShimResult};
use crate::ports::outbound::{methods, CompositeKeyQuery, LedgerTransport, LogLevel, RangeQuery};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Param and result shapes shared by the client and the dev node.
///
/// Byte values travel hex-encoded; field names are camelCase.
pub mod wire {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct EmptyParams {}

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct KeyParams {
        pub key: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PutStateParams {
        pub key: String,
        #[serde(with = "hex::serde")]
        pub value: Vec<u8>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct GetStateResult {
        pub found: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub value: Option<String>,
    }

    /// Outcome of a write-like call. `success: false` is a node-side refusal.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct WriteResult {
        pub success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }

    impl WriteResult {
        pub fn ok() -> Self {
            Self {
                success: true,
                error: None,
            }
        }

        pub fn rejected(reason: impl Into<String>) -> Self {
            Self {
                success: false,
                error: Some(reason.into()),
            }
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RangeParams {
        pub start_key: String,
        #[serde(default)]
        pub end_key: String,
        #[serde(default)]
        pub page_size: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub bookmark: Option<String>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PartialKeyParams {
        pub object_type: String,
        #[serde(default)]
        pub keys: Vec<String>,
        #[serde(default)]
        pub page_size: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub bookmark: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct WireKeyValue {
        pub key: String,
        #[serde(with = "hex::serde")]
        pub value: Vec<u8>,
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct QueryResult {
        pub results: Vec<WireKeyValue>,
        #[serde(default)]
        pub has_more: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub bookmark: Option<String>,
    }

    impl From<QueryPage> for QueryResult {
        fn from(page: QueryPage) -> Self {
            Self {
                results: page
                    .results
                    .into_iter()
                    .map(|kv| WireKeyValue {
                        key: kv.key,
                        value: kv.value,
                    })
                    .collect(),
                has_more: page.has_more,
                bookmark: page.bookmark,
            }
        }
    }

    impl From<QueryResult> for QueryPage {
        fn from(result: QueryResult) -> Self {
            Self {
                results: result
                    .results
                    .into_iter()
                    .map(|kv| KeyValue::new(kv.key, kv.value))
                    .collect(),
                has_more: result.has_more,
                bookmark: result.bookmark,
            }
        }
    }

    impl From<&RangeQuery> for RangeParams {
        fn from(query: &RangeQuery) -> Self {
            Self {
                start_key: query.start_key.clone(),
                end_key: query.end_key.clone(),
                page_size: query.page_size,
                bookmark: query.bookmark.clone(),
            }
        }
    }

    impl From<RangeParams> for RangeQuery {
        fn from(params: RangeParams) -> Self {
            Self {
                start_key: params.start_key,
                end_key: params.end_key,
                page_size: params.page_size,
                bookmark: params.bookmark,
            }
        }
    }

    impl From<&CompositeKeyQuery> for PartialKeyParams {
        fn from(query: &CompositeKeyQuery) -> Self {
            Self {
                object_type: query.object_type.clone(),
                keys: query.keys.clone(),
                page_size: query.page_size,
                bookmark: query.bookmark.clone(),
            }
        }
    }

    impl From<PartialKeyParams> for CompositeKeyQuery {
        fn from(params: PartialKeyParams) -> Self {
            Self {
                object_type: params.object_type,
                keys: params.keys,
                page_size: params.page_size,
                bookmark: params.bookmark,
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionIdResult {
        pub transaction_id: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ChannelIdResult {
        pub channel_id: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CreatorResult {
        #[serde(with = "hex::serde")]
        pub creator: Vec<u8>,
    }

    #[derive(Debug, Clone, Copy, Serialize, Deserialize)]
    pub struct TimestampResult {
        pub seconds: i64,
        pub nanos: u32,
    }

    impl From<DateTime<Utc>> for TimestampResult {
        fn from(timestamp: DateTime<Utc>) -> Self {
            Self {
                seconds: timestamp.timestamp(),
                nanos: timestamp.timestamp_subsec_nanos(),
            }
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SetEventParams {
        pub name: String,
        #[serde(with = "hex::serde")]
        pub payload: Vec<u8>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LogMessageParams {
        pub level: LogLevel,
        pub message: String,
    }
}

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Ledger transport over HTTP POST to the node's JSON-RPC endpoint.
///
/// Owned by exactly one stub for one invocation.
pub struct JsonRpcTransport {
    http_client: reqwest::Client,
    rpc_url: String,
    request_id: AtomicU64,
    closed: AtomicBool,
}

impl JsonRpcTransport {
    /// Create a transport for `address`; `http://` is assumed when no scheme
    /// is given.
    ///
    /// `request_timeout` is only a backstop on the HTTP client. The stub's
    /// point and range deadlines bound each call, so pass the longer one.
    pub fn new(address: &str, request_timeout: Duration) -> Self {
        let rpc_url = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{address}")
        };

        // reqwest::Client::new() is infallible; fall back to it if the builder fails
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            rpc_url,
            request_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Make a JSON-RPC call.
    async fn call<P: Serialize + Send + Sync, R: DeserializeOwned + Send>(
        &self,
        method: &'static str,
        params: P,
    ) -> ShimResult<R> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ShimError::Transport {
                method,
                message: "transport is closed".to_string(),
            });
        }
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        tracing::trace!(method, id, "Sending shim RPC");
        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ShimError::Transport {
                method,
                message: e.to_string(),
            })?;

        let rpc_response: JsonRpcResponse<R> =
            response.json().await.map_err(|e| ShimError::Protocol {
                method,
                code: codes::PARSE_ERROR,
                message: format!("failed to parse RPC response: {e}"),
            })?;

        if let Some(error) = rpc_response.error {
            return Err(ShimError::Protocol {
                method,
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| ShimError::Protocol {
            method,
            code: codes::INTERNAL_ERROR,
            message: "RPC response missing result".to_string(),
        })
    }

    async fn write_call<P: Serialize + Send + Sync>(
        &self,
        method: &'static str,
        key: &str,
        params: P,
    ) -> ShimResult<()> {
        let result: wire::WriteResult = self.call(method, params).await?;
        if !result.success {
            return Err(ShimError::WriteRejected {
                key: key.to_string(),
                reason: result.error.unwrap_or_else(|| "rejected by node".to_string()),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl LedgerTransport for JsonRpcTransport {
    async fn get_state(&self, key: &str) -> ShimResult<Option<Vec<u8>>> {
        let result: wire::GetStateResult = self
            .call(methods::GET_STATE, wire::KeyParams { key: key.to_string() })
            .await?;
        if !result.found {
            return Ok(None);
        }
        let encoded = result.value.unwrap_or_default();
        hex::decode(&encoded).map(Some).map_err(|e| ShimError::Protocol {
            method: methods::GET_STATE,
            code: codes::PARSE_ERROR,
            message: format!("value for {key:?} is not hex: {e}"),
        })
    }

    async fn put_state(&self, key: &str, value: &[u8]) -> ShimResult<()> {
        let params = wire::PutStateParams {
            key: key.to_string(),
            value: value.to_vec(),
        };
        self.write_call(methods::PUT_STATE, key, params).await
    }

    async fn delete_state(&self, key: &str) -> ShimResult<()> {
        let params = wire::KeyParams { key: key.to_string() };
        self.write_call(methods::DELETE_STATE, key, params).await
    }

    async fn get_state_by_range(&self, query: &RangeQuery) -> ShimResult<QueryPage> {
        let result: wire::QueryResult = self
            .call(methods::GET_STATE_BY_RANGE, wire::RangeParams::from(query))
            .await?;
        Ok(result.into())
    }

    async fn get_state_by_partial_composite_key(
        &self,
        query: &CompositeKeyQuery,
    ) -> ShimResult<QueryPage> {
        let result: wire::QueryResult = self
            .call(
                methods::GET_STATE_BY_PARTIAL_COMPOSITE_KEY,
                wire::PartialKeyParams::from(query),
            )
            .await?;
        Ok(result.into())
    }

    async fn get_transaction_id(&self) -> ShimResult<String> {
        let result: wire::TransactionIdResult = self
            .call(methods::GET_TRANSACTION_ID, wire::EmptyParams::default())
            .await?;
        Ok(result.transaction_id)
    }

    async fn get_channel_id(&self) -> ShimResult<String> {
        let result: wire::ChannelIdResult = self
            .call(methods::GET_CHANNEL_ID, wire::EmptyParams::default())
            .await?;
        Ok(result.channel_id)
    }

    async fn get_creator(&self) -> ShimResult<Vec<u8>> {
        let result: wire::CreatorResult = self
            .call(methods::GET_CREATOR, wire::EmptyParams::default())
            .await?;
        Ok(result.creator)
    }

    async fn get_transaction_timestamp(&self) -> ShimResult<DateTime<Utc>> {
        let result: wire::TimestampResult = self
            .call(methods::GET_TRANSACTION_TIMESTAMP, wire::EmptyParams::default())
            .await?;
        DateTime::from_timestamp(result.seconds, result.nanos).ok_or_else(|| ShimError::Protocol {
            method: methods::GET_TRANSACTION_TIMESTAMP,
            code: codes::INVALID_PARAMS,
            message: format!(
                "timestamp out of range: {}s {}ns",
                result.seconds, result.nanos
            ),
        })
    }

    async fn set_event(&self, name: &str, payload: &[u8]) -> ShimResult<()> {
        let params = wire::SetEventParams {
            name: name.to_string(),
            payload: payload.to_vec(),
        };
        let result: wire::WriteResult = self.call(methods::SET_EVENT, params).await?;
        if !result.success {
            return Err(ShimError::EventRejected {
                name: name.to_string(),
                reason: result.error.unwrap_or_else(|| "rejected by node".to_string()),
            });
        }
        Ok(())
    }

    async fn log_message(&self, level: LogLevel, message: &str) -> ShimResult<()> {
        let params = wire::LogMessageParams {
            level,
            message: message.to_string(),
        };
        let _: wire::WriteResult = self.call(methods::LOG_MESSAGE, params).await?;
        Ok(())
    }

    async fn close(&self) -> ShimResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::debug!(url = %self.rpc_url, "Shim transport closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_added() {
        let transport = JsonRpcTransport::new("127.0.0.1:9090", Duration::from_secs(1));
        assert_eq!(transport.rpc_url(), "http://127.0.0.1:9090");
        let explicit = JsonRpcTransport::new("https://node:443", Duration::from_secs(1));
        assert_eq!(explicit.rpc_url(), "https://node:443");
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let params = wire::RangeParams {
            start_key: "a".into(),
            end_key: "b".into(),
            page_size: 10,
            bookmark: None,
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["startKey"], "a");
        assert_eq!(json["pageSize"], 10);
        assert!(json.get("bookmark").is_none());

        let put = wire::PutStateParams {
            key: "k".into(),
            value: vec![0xab, 0x01],
        };
        assert_eq!(serde_json::to_value(&put).unwrap()["value"], "ab01");
    }

    #[test]
    fn test_query_result_conversion() {
        let json = serde_json::json!({
            "results": [{"key": "k1", "value": "6869"}],
            "hasMore": true,
            "bookmark": "k1"
        });
        let result: wire::QueryResult = serde_json::from_value(json).unwrap();
        let page: QueryPage = result.into();
        assert_eq!(page.results[0].value, b"hi".to_vec());
        assert!(page.has_more);
        assert_eq!(page.bookmark.as_deref(), Some("k1"));
    }

    #[tokio::test]
    async fn test_closed_transport_refuses_calls() {
        let transport = JsonRpcTransport::new("127.0.0.1:1", Duration::from_secs(1));
        transport.close().await.unwrap();
        transport.close().await.unwrap();
        let err = transport.get_state("k").await.unwrap_err();
        assert!(matches!(err, ShimError::Transport { ref message, .. } if message.contains("closed")));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let transport = JsonRpcTransport::new("127.0.0.1:1", Duration::from_secs(2));
        let err = transport.get_state("k").await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Transport);
    }
}
