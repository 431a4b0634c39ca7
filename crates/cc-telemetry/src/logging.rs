//! Structured logging setup.
//!
//! Logs go to stderr so a chaincode process can keep stdout for its
//! response summary. Fields used consistently across crates:
//! - `tx_id`: transaction the invocation runs under
//! - `function`: chaincode function name
//! - `method`: shim RPC method
//! - `key`: ledger key touched

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber described by `config`.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] when another subscriber
/// is already installed (common in test binaries); callers that only need
/// "logging is on" can ignore that variant.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = if config.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialised"
    );
    Ok(())
}

/// Log an invocation-scoped event with the standard `tx_id` field.
#[macro_export]
macro_rules! log_invocation_event {
    ($level:ident, $msg:expr, $tx_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            tx_id = %$tx_id,
            $($($field)*,)?
            $msg
        )
    };
}
