//! Dev node configuration.

use crate::DevNodeError;
use std::env;
use std::net::SocketAddr;

/// Environment variable names read by [`DevNodeConfig::from_env`].
pub mod vars {
    pub const LISTEN_ADDR: &str = "DEVNODE_LISTEN_ADDR";
    pub const CHANNEL_ID: &str = "DEVNODE_CHANNEL_ID";
    pub const PAGE_SIZE: &str = "DEVNODE_PAGE_SIZE";
}

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9090";
pub const DEFAULT_CHANNEL_ID: &str = "devnet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevNodeConfig {
    /// Address the JSON-RPC endpoint binds to (port 0 picks a free port)
    pub listen_addr: SocketAddr,

    /// Channel reported by `shim_getChannelId`
    pub channel_id: String,

    /// Largest page handed out by range queries (0 = ledger default)
    pub max_page_size: u32,
}

impl Default for DevNodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
            channel_id: DEFAULT_CHANNEL_ID.to_string(),
            max_page_size: 0,
        }
    }
}

impl DevNodeConfig {
    /// Read configuration from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `DEVNODE_LISTEN_ADDR`: bind address (default: 127.0.0.1:9090)
    /// - `DEVNODE_CHANNEL_ID`: channel id (default: devnet)
    /// - `DEVNODE_PAGE_SIZE`: page size cap (default: ledger default)
    pub fn from_env() -> Result<Self, DevNodeError> {
        let defaults = Self::default();

        let listen_addr = match non_empty_var(vars::LISTEN_ADDR) {
            Some(raw) => raw.parse().map_err(|_| {
                DevNodeError::Config(format!("{} is not a socket address: {raw:?}", vars::LISTEN_ADDR))
            })?,
            None => defaults.listen_addr,
        };

        let max_page_size = match non_empty_var(vars::PAGE_SIZE) {
            Some(raw) => raw.parse().map_err(|_| {
                DevNodeError::Config(format!("{} must be an integer, got {raw:?}", vars::PAGE_SIZE))
            })?,
            None => defaults.max_page_size,
        };

        Ok(Self {
            listen_addr,
            channel_id: non_empty_var(vars::CHANNEL_ID).unwrap_or(defaults.channel_id),
            max_page_size,
        })
    }

    /// Ephemeral-port configuration for tests.
    pub fn local() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Self::default()
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
