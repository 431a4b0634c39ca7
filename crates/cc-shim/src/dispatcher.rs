//! # Lifecycle Dispatcher
//!
//! Drives one invocation through
//! `Uninitialized -> StubConstructed -> Init | Invoke -> Terminated`:
//! builds exactly one stub, resolves the transaction context, routes to the
//! chaincode, and always closes the transport on the way out.

use crate::adapters::JsonRpcTransport;
use crate::config::ShimConfig;
use crate::domain::{Invocation, InvocationMode, Response};
use crate::errors::ErrorKind;
use crate::ports::outbound::{LedgerTransport, LogLevel};
use crate::ports::Chaincode;
use crate::stub::ChaincodeStub;
use cc_telemetry::{init_logging, TelemetryConfig, TelemetryError};
use std::process::ExitCode;
use std::sync::Arc;

/// Lifecycle states of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    StubConstructed,
    Init,
    Invoke,
    Terminated,
}

impl LifecycleState {
    /// Legal transitions. `StubConstructed -> Terminated` covers an
    /// invocation whose context could not be resolved.
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, StubConstructed)
                | (StubConstructed, Init)
                | (StubConstructed, Invoke)
                | (StubConstructed, Terminated)
                | (Init, Terminated)
                | (Invoke, Terminated)
        )
    }
}

struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    fn advance(&mut self, next: LifecycleState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal lifecycle transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::trace!(from = ?self.state, to = ?next, "Lifecycle transition");
        self.state = next;
    }
}

/// Run one invocation against `transport` and return the chaincode's response.
///
/// A failure to resolve the transaction context produces an error response
/// and the chaincode is never called.
pub async fn run_invocation<C: Chaincode + ?Sized>(
    chaincode: &C,
    transport: Arc<dyn LedgerTransport>,
    invocation: Invocation,
    config: &ShimConfig,
) -> Response {
    let mut lifecycle = Lifecycle::new();
    let mode = invocation.mode;
    let function = invocation.function.clone();

    let stub = ChaincodeStub::new(Arc::clone(&transport), invocation, config);
    lifecycle.advance(LifecycleState::StubConstructed);

    let response = match stub.transaction_context().await {
        Err(e) => {
            tracing::error!(function = %function, error = %e, "Failed to resolve transaction context");
            Response::error_with_kind(
                e.kind(),
                format!("failed to resolve transaction context: {e}"),
            )
        }
        Ok(context) => {
            let tx_id = context.transaction_id.clone();
            cc_telemetry::log_invocation_event!(info, "Invocation started", tx_id, function = %function, mode = ?mode);
            let response = match mode {
                InvocationMode::Init => {
                    lifecycle.advance(LifecycleState::Init);
                    chaincode.init(&stub).await
                }
                InvocationMode::Invoke => {
                    lifecycle.advance(LifecycleState::Invoke);
                    chaincode.invoke(&stub).await
                }
            };
            if response.is_success() {
                cc_telemetry::log_invocation_event!(info, "Invocation succeeded", tx_id, function = %function);
            } else {
                cc_telemetry::log_invocation_event!(
                    warn,
                    "Invocation failed",
                    tx_id,
                    function = %function,
                    kind = ?response.kind,
                    message = %response.message
                );
            }
            response
        }
    };

    stub.log_message(
        LogLevel::Info,
        &format!(
            "Chaincode completed with status: {}, message: {}",
            response.status, response.message
        ),
    )
    .await;

    if let Err(e) = transport.close().await {
        tracing::warn!(error = %e, "Failed to close shim transport");
    }
    lifecycle.advance(LifecycleState::Terminated);
    response
}

/// Process entry point for a chaincode binary.
///
/// Reads [`ShimConfig`] from the environment, installs logging, connects to
/// the node over JSON-RPC, runs the invocation, prints the response summary
/// on stdout and returns the exit code the node keys its commit on.
pub async fn start<C: Chaincode>(chaincode: C) -> ExitCode {
    install_logging(chaincode.name());

    let config = match ShimConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid shim configuration");
            return finish(Response::error_with_kind(ErrorKind::Validation, e.to_string()));
        }
    };

    let invocation = match config.invocation_from_env() {
        Ok(invocation) => invocation,
        Err(e) => {
            tracing::error!(error = %e, "Invalid invocation arguments");
            return finish(Response::error_with_kind(e.kind(), e.to_string()));
        }
    };
    let transport: Arc<dyn LedgerTransport> = Arc::new(JsonRpcTransport::new(
        &config.ledger_address,
        config.range_timeout,
    ));
    tracing::debug!(ledger = %config.ledger_address, function = %invocation.function, "Starting invocation");

    let response = run_invocation(&chaincode, transport, invocation, &config).await;
    finish(response)
}

fn finish(response: Response) -> ExitCode {
    println!("{}", response.summary_json());
    ExitCode::from(response.exit_code())
}

fn install_logging(service_name: &str) {
    let telemetry = TelemetryConfig::for_service(service_name);
    if let Err(TelemetryError::Config(reason)) = init_logging(&telemetry) {
        let fallback = TelemetryConfig {
            log_level: "info".to_string(),
            ..telemetry
        };
        if init_logging(&fallback).is_ok() {
            tracing::warn!(%reason, "Invalid log filter, using info");
        }
    }
}
