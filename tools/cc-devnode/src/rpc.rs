//! JSON-RPC method table.
//!
//! Every `shim_*` method is served from the [`InMemoryLedger`] through its
//! [`LedgerTransport`] implementation, so the dev node and in-process tests
//! share one ledger semantics. The `dev_*` methods drive transactions.

use cc_shim::adapters::{wire, InMemoryLedger, JsonRpcError, TransactionSpec};
use cc_shim::errors::codes;
use cc_shim::ports::{methods, CompositeKeyQuery, LedgerTransport, RangeQuery};
use cc_shim::{ShimError, ShimResult};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

/// Transaction control methods served next to the shim surface.
pub mod dev_methods {
    pub const BEGIN_TRANSACTION: &str = "dev_beginTransaction";
    pub const COMMIT: &str = "dev_commit";
    pub const ROLLBACK: &str = "dev_rollback";
    pub const EVENTS: &str = "dev_events";
}

/// Params of `dev_beginTransaction`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginTransactionParams {
    /// Defaults to a random UUID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Hex-encoded creator identity; empty when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    /// Defaults to the wall clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<i64>,
}

type RpcResult = Result<Value, JsonRpcError>;

fn rpc_error(code: i64, message: impl Into<String>) -> JsonRpcError {
    JsonRpcError {
        code,
        message: message.into(),
    }
}

fn from_shim(err: ShimError) -> JsonRpcError {
    match err {
        ShimError::Protocol { code, message, .. } => rpc_error(code, message),
        ShimError::InvalidArgument(_) | ShimError::InvalidFormat(_) => {
            rpc_error(codes::INVALID_PARAMS, err.to_string())
        }
        other => rpc_error(codes::INTERNAL_ERROR, other.to_string()),
    }
}

fn params_of<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| rpc_error(codes::INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn to_result<T: Serialize>(value: T) -> RpcResult {
    serde_json::to_value(value).map_err(|e| rpc_error(codes::INTERNAL_ERROR, e.to_string()))
}

/// Node-side refusals are results with `success: false`, not RPC errors.
fn write_outcome(outcome: ShimResult<()>) -> RpcResult {
    match outcome {
        Ok(()) => to_result(wire::WriteResult::ok()),
        Err(ShimError::WriteRejected { reason, .. } | ShimError::EventRejected { reason, .. }) => {
            to_result(wire::WriteResult::rejected(reason))
        }
        Err(e) => Err(from_shim(e)),
    }
}

/// Serve one method call.
pub async fn dispatch(ledger: &InMemoryLedger, method: &str, params: Value) -> RpcResult {
    tracing::debug!(method, "Serving RPC");
    match method {
        methods::GET_STATE => {
            let p: wire::KeyParams = params_of(params)?;
            let value = ledger.get_state(&p.key).await.map_err(from_shim)?;
            to_result(wire::GetStateResult {
                found: value.is_some(),
                value: value.map(hex::encode),
            })
        }
        methods::PUT_STATE => {
            let p: wire::PutStateParams = params_of(params)?;
            write_outcome(ledger.put_state(&p.key, &p.value).await)
        }
        methods::DELETE_STATE => {
            let p: wire::KeyParams = params_of(params)?;
            write_outcome(ledger.delete_state(&p.key).await)
        }
        methods::GET_STATE_BY_RANGE => {
            let p: wire::RangeParams = params_of(params)?;
            let query = RangeQuery::from(p);
            let page = ledger.get_state_by_range(&query).await.map_err(from_shim)?;
            to_result(wire::QueryResult::from(page))
        }
        methods::GET_STATE_BY_PARTIAL_COMPOSITE_KEY => {
            let p: wire::PartialKeyParams = params_of(params)?;
            let query = CompositeKeyQuery::from(p);
            let page = ledger
                .get_state_by_partial_composite_key(&query)
                .await
                .map_err(from_shim)?;
            to_result(wire::QueryResult::from(page))
        }
        methods::GET_TRANSACTION_ID => to_result(wire::TransactionIdResult {
            transaction_id: ledger.get_transaction_id().await.map_err(from_shim)?,
        }),
        methods::GET_CHANNEL_ID => to_result(wire::ChannelIdResult {
            channel_id: ledger.get_channel_id().await.map_err(from_shim)?,
        }),
        methods::GET_CREATOR => to_result(wire::CreatorResult {
            creator: ledger.get_creator().await.map_err(from_shim)?,
        }),
        methods::GET_TRANSACTION_TIMESTAMP => {
            let timestamp = ledger
                .get_transaction_timestamp()
                .await
                .map_err(from_shim)?;
            to_result(wire::TimestampResult::from(timestamp))
        }
        methods::SET_EVENT => {
            let p: wire::SetEventParams = params_of(params)?;
            write_outcome(ledger.set_event(&p.name, &p.payload).await)
        }
        methods::LOG_MESSAGE => {
            let p: wire::LogMessageParams = params_of(params)?;
            ledger
                .log_message(p.level, &p.message)
                .await
                .map_err(from_shim)?;
            to_result(wire::WriteResult::ok())
        }
        dev_methods::BEGIN_TRANSACTION => {
            let p: BeginTransactionParams = params_of(params)?;
            let spec = transaction_spec(p)?;
            let transaction_id = spec.transaction_id.clone();
            ledger.begin_transaction(spec).map_err(from_shim)?;
            to_result(wire::TransactionIdResult { transaction_id })
        }
        dev_methods::COMMIT => to_result(ledger.commit().map_err(from_shim)?),
        dev_methods::ROLLBACK => to_result(wire::TransactionIdResult {
            transaction_id: ledger.rollback().map_err(from_shim)?,
        }),
        dev_methods::EVENTS => to_result(ledger.events()),
        other => Err(rpc_error(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    }
}

fn transaction_spec(params: BeginTransactionParams) -> Result<TransactionSpec, JsonRpcError> {
    let creator = match params.creator {
        Some(encoded) => hex::decode(&encoded)
            .map_err(|e| rpc_error(codes::INVALID_PARAMS, format!("creator is not hex: {e}")))?,
        None => Vec::new(),
    };
    let timestamp = match params.timestamp_seconds {
        Some(seconds) => DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
            rpc_error(
                codes::INVALID_PARAMS,
                format!("timestamp out of range: {seconds}"),
            )
        })?,
        None => Utc::now(),
    };
    Ok(TransactionSpec {
        transaction_id: params
            .transaction_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        creator,
        timestamp,
    })
}

/// Handle one JSON-RPC request object and build its response envelope.
pub async fn handle_request(ledger: &InMemoryLedger, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return json!({
            "jsonrpc": "2.0",
            "error": {
                "code": codes::INVALID_REQUEST,
                "message": "Invalid Request: missing method"
            },
            "id": id
        });
    };
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    match dispatch(ledger, method, params).await {
        Ok(result) => json!({ "jsonrpc": "2.0", "result": result, "id": id }),
        Err(error) => {
            tracing::debug!(method, code = error.code, message = %error.message, "RPC failed");
            json!({ "jsonrpc": "2.0", "error": error, "id": id })
        }
    }
}
