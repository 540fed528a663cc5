//! # socks5d - Minimal SOCKS5 Proxy Server
//!
//! socks5d accepts SOCKS5 clients, parses their requests, resolves and dials
//! CONNECT destinations and relays bytes in both directions until either side
//! is done.
//!
//! ## Features
//!
//! - **CONNECT only**: BIND and UDP ASSOCIATE are answered with "command not supported"
//! - **Typed requests**: the parser yields a [`socks::Request`] that still owns the client reader
//! - **Pluggable outbound**: dialing and resolution sit behind the [`socks::Dialer`]
//!   and [`socks::Resolver`] traits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use socks5d::config::load_config;
//! use socks5d::server::run_server;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_server(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Client -> greeting -> parse_request -> Socks5Handler -> resolve -> dial -> relay -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{Socks5Error, Socks5ReplyCode};
pub use server::run_server;

/// Version of the socks5d library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
