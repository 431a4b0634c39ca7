//! Telemetry configuration from environment variables.

use std::env;

/// Environment variable names read by [`TelemetryConfig::from_env`].
pub mod vars {
    /// Service name attached to every log line.
    pub const SERVICE_NAME: &str = "CHAINCODE_SERVICE_NAME";
    /// Log filter directive (falls back to `RUST_LOG`).
    pub const LOG_LEVEL: &str = "CHAINCODE_LOG_LEVEL";
    /// Emit JSON lines instead of human-readable output.
    pub const JSON_LOGS: &str = "CHAINCODE_JSON_LOGS";
}

/// Configuration for process-local logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name recorded in the startup event
    pub service_name: String,

    /// `EnvFilter` directive (trace, debug, info, warn, error, or per-target)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "chaincode".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CHAINCODE_SERVICE_NAME`: Service name (default: chaincode)
    /// - `CHAINCODE_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `CHAINCODE_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var(vars::SERVICE_NAME)
                .unwrap_or_else(|_| "chaincode".to_string()),

            log_level: env::var(vars::LOG_LEVEL)
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var(vars::JSON_LOGS)
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Create configuration for a named component, keeping env overrides.
    pub fn for_service(service_name: &str) -> Self {
        let mut config = Self::from_env();
        if env::var(vars::SERVICE_NAME).is_err() {
            config.service_name = service_name.to_string();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "chaincode");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_for_service_names_component() {
        if env::var(vars::SERVICE_NAME).is_err() {
            let config = TelemetryConfig::for_service("gateway-registry");
            assert_eq!(config.service_name, "gateway-registry");
        }
    }
}
