//! HTTP server hosting the JSON-RPC endpoint.

use crate::config::DevNodeConfig;
use crate::rpc;
use crate::DevNodeError;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use cc_shim::errors::codes;
use cc_shim::InMemoryLedger;
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Development node: one in-memory ledger behind a JSON-RPC endpoint.
pub struct DevNode {
    config: DevNodeConfig,
    ledger: Arc<InMemoryLedger>,
}

impl DevNode {
    pub fn new(config: DevNodeConfig) -> Self {
        let ledger = InMemoryLedger::new(config.channel_id.clone())
            .with_max_page_size(config.max_page_size);
        Self {
            config,
            ledger: Arc::new(ledger),
        }
    }

    /// Shared handle to the ledger, e.g. for seeding state before serving.
    pub fn ledger(&self) -> Arc<InMemoryLedger> {
        Arc::clone(&self.ledger)
    }

    /// `POST /` serves JSON-RPC, `GET /health` reports liveness.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handle_json_rpc))
            .route("/health", get(health_check))
            .with_state(Arc::clone(&self.ledger))
    }

    /// Bind the listener and serve in a background task.
    pub async fn spawn(self) -> Result<RunningNode, DevNodeError> {
        let listener = tokio::net::TcpListener::bind(self.config.listen_addr)
            .await
            .map_err(|e| DevNodeError::Bind {
                addr: self.config.listen_addr,
                source: e,
            })?;
        let local_addr = listener.local_addr().map_err(DevNodeError::Io)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let router = self.router();
        info!(addr = %local_addr, channel = %self.config.channel_id, "Dev node listening");
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(RunningNode {
            local_addr,
            ledger: self.ledger,
            shutdown_tx,
            handle,
        })
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<(), DevNodeError> {
        let running = self.spawn().await?;
        shutdown.await;
        info!("Received shutdown signal");
        running.stop().await
    }
}

/// A dev node serving in the background. Dropping it shuts the server down.
pub struct RunningNode {
    local_addr: SocketAddr,
    ledger: Arc<InMemoryLedger>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningNode {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Endpoint URL suitable for `CHAINCODE_LEDGER_ADDRESS`.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn stop(self) -> Result<(), DevNodeError> {
        let _ = self.shutdown_tx.send(());
        match self.handle.await {
            Ok(served) => served.map_err(DevNodeError::Io),
            Err(e) => {
                error!(error = %e, "Dev node task failed");
                Err(DevNodeError::Task(e.to_string()))
            }
        }
    }
}

/// Handle a JSON-RPC request or batch.
async fn handle_json_rpc(
    State(ledger): State<Arc<InMemoryLedger>>,
    body: String,
) -> impl IntoResponse {
    let request: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "jsonrpc": "2.0",
                    "error": {
                        "code": codes::PARSE_ERROR,
                        "message": format!("Parse error: {e}")
                    },
                    "id": null
                })),
            );
        }
    };

    let response = match request {
        Value::Array(requests) => {
            let mut responses = Vec::with_capacity(requests.len());
            for req in &requests {
                responses.push(rpc::handle_request(&ledger, req).await);
            }
            Value::Array(responses)
        }
        single => rpc::handle_request(&ledger, &single).await,
    };

    (StatusCode::OK, Json(response))
}

async fn health_check(State(ledger): State<Arc<InMemoryLedger>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "channelId": ledger.channel_id(),
        "keys": ledger.committed_len(),
        "pendingTransaction": ledger.has_pending_transaction(),
    }))
}
