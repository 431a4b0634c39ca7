//! # Chaincode Telemetry
//!
//! Logging setup for chaincode processes and the development ledger node.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cc_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::for_service("supply-chain");
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CHAINCODE_SERVICE_NAME` | `chaincode` | Service name in the startup event |
//! | `CHAINCODE_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `CHAINCODE_JSON_LOGS` | `false` | JSON lines instead of text |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::{vars, TelemetryConfig};
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The configuration could not be turned into a subscriber.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A global subscriber was installed before this call.
    #[error("Subscriber already installed: {0}")]
    AlreadyInitialized(String),
}
