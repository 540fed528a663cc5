//! Server configuration types
//!
//! Defines the configuration structures for the socks5d server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default listen address
fn default_listen_addr() -> String {
    "127.0.0.1:1080".to_string()
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to accept SOCKS5 clients on (e.g., "0.0.0.0:1080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SOCKS5 request handling configuration
    #[serde(default)]
    pub socks: SocksConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            socks: SocksConfig::default(),
        }
    }
}

/// Default connect timeout in seconds
fn default_connect_timeout() -> u64 {
    10
}

fn default_nodelay() -> bool {
    true
}

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// SOCKS5 request handling configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SocksConfig {
    /// Outbound connect timeout in seconds (0 = no timeout)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Enable TCP_NODELAY on outbound connections
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive timeout in seconds (0 = disabled)
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
}

impl Default for SocksConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
        }
    }
}

impl SocksConfig {
    /// Outbound connect timeout, `None` when disabled
    pub fn connect_timeout_duration(&self) -> Option<Duration> {
        match self.connect_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
