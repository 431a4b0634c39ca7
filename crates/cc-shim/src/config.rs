//! Process configuration for one chaincode invocation.

use crate::domain::Invocation;
use crate::errors::{ShimError, ShimResult};
use std::env;
use std::ffi::OsString;
use std::time::Duration;

/// Environment variable names read by [`ShimConfig::from_env`].
pub mod vars {
    pub const LEDGER_ADDRESS: &str = "CHAINCODE_LEDGER_ADDRESS";
    pub const TX_ID: &str = "CHAINCODE_TX_ID";
    pub const FUNCTION: &str = "CHAINCODE_FUNCTION";
    pub const POINT_TIMEOUT_MS: &str = "CHAINCODE_POINT_TIMEOUT_MS";
    pub const RANGE_TIMEOUT_MS: &str = "CHAINCODE_RANGE_TIMEOUT_MS";
    pub const PAGE_SIZE: &str = "CHAINCODE_PAGE_SIZE";
}

/// Default node endpoint.
pub const DEFAULT_LEDGER_ADDRESS: &str = "http://127.0.0.1:9090";

/// Deadline for single-key operations and context lookups.
pub const DEFAULT_POINT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for range and partial-composite-key queries.
pub const DEFAULT_RANGE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Shim configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimConfig {
    /// JSON-RPC endpoint of the node
    pub ledger_address: String,

    /// Pre-assigned transaction id; skips the `GetTransactionID` RPC
    pub transaction_id: Option<String>,

    /// Function name; `init` selects Init mode
    pub function: String,

    pub point_timeout: Duration,
    pub range_timeout: Duration,

    /// Requested page size for range queries (0 = node default)
    pub page_size: u32,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            ledger_address: DEFAULT_LEDGER_ADDRESS.to_string(),
            transaction_id: None,
            function: crate::domain::context::DEFAULT_FUNCTION.to_string(),
            point_timeout: DEFAULT_POINT_TIMEOUT,
            range_timeout: DEFAULT_RANGE_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ShimConfig {
    /// Read configuration from the environment.
    ///
    /// Unset variables fall back to defaults; malformed numbers are errors.
    pub fn from_env() -> ShimResult<Self> {
        let defaults = Self::default();
        let config = Self {
            ledger_address: non_empty_var(vars::LEDGER_ADDRESS)
                .unwrap_or(defaults.ledger_address),
            transaction_id: non_empty_var(vars::TX_ID),
            function: non_empty_var(vars::FUNCTION).unwrap_or(defaults.function),
            point_timeout: duration_ms_var(vars::POINT_TIMEOUT_MS)?
                .unwrap_or(defaults.point_timeout),
            range_timeout: duration_ms_var(vars::RANGE_TIMEOUT_MS)?
                .unwrap_or(defaults.range_timeout),
            page_size: match non_empty_var(vars::PAGE_SIZE) {
                Some(raw) => raw.parse().map_err(|_| {
                    ShimError::Configuration(format!("{} must be an integer, got {raw:?}", vars::PAGE_SIZE))
                })?,
                None => defaults.page_size,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ShimResult<()> {
        if self.ledger_address.trim().is_empty() {
            return Err(ShimError::Configuration(
                "ledger address cannot be empty".to_string(),
            ));
        }
        if self.point_timeout.is_zero() || self.range_timeout.is_zero() {
            return Err(ShimError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Invocation built from the configured function and the process argv
    /// (program name skipped).
    pub fn invocation_from_env(&self) -> ShimResult<Invocation> {
        self.invocation_from_args(env::args_os().skip(1))
    }

    /// Arguments must be valid UTF-8; the first one that is not fails the
    /// invocation.
    pub fn invocation_from_args(
        &self,
        args: impl IntoIterator<Item = OsString>,
    ) -> ShimResult<Invocation> {
        let args = args
            .into_iter()
            .enumerate()
            .map(|(position, arg)| {
                arg.into_string().map_err(|raw| {
                    ShimError::InvalidArgument(format!(
                        "argument {position} is not valid UTF-8: {}",
                        raw.to_string_lossy()
                    ))
                })
            })
            .collect::<ShimResult<Vec<_>>>()?;
        Ok(Invocation::new(self.function.clone(), args))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn duration_ms_var(name: &str) -> ShimResult<Option<Duration>> {
    non_empty_var(name)
        .map(|raw| {
            raw.parse::<u64>().map(Duration::from_millis).map_err(|_| {
                ShimError::Configuration(format!("{name} must be milliseconds, got {raw:?}"))
            })
        })
        .transpose()
}
