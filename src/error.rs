//! Error types for socks5d
//!
//! This module defines the error and reply-code types used by the SOCKS5
//! request pipeline.

use std::io;
use thiserror::Error;

/// SOCKS5 specific errors
///
/// Every variant is scoped to a single client connection; none of them is
/// fatal to the server.
#[derive(Error, Debug)]
pub enum Socks5Error {
    /// Unsupported SOCKS version
    #[error("Unsupported SOCKS version: {0}")]
    UnsupportedVersion(u8),

    /// No acceptable authentication method offered in the greeting
    #[error("No acceptable authentication method")]
    NoAcceptableMethod,

    /// Address type tag outside of IPv4/domain/IPv6
    #[error("Unrecognized address type: {0}")]
    UnrecognizedAddressType(u8),

    /// Address that cannot be put on the wire
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Command byte outside of CONNECT/BIND/UDP ASSOCIATE
    #[error("Unsupported command: {0}")]
    CommandNotSupported(u8),

    /// Domain name resolution failed
    #[error("Failed to resolve destination '{domain}': {source}")]
    ResolveFailed {
        /// Domain that was looked up
        domain: String,
        /// Underlying resolver error
        #[source]
        source: io::Error,
    },

    /// Outbound dial failed
    #[error("Connect to {target} failed: {source}")]
    ConnectFailed {
        /// Destination as requested by the client
        target: String,
        /// Underlying dial error
        #[source]
        source: io::Error,
    },

    /// Transport error (read/write/truncation)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Socks5ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<Socks5ReplyCode> for u8 {
    fn from(code: Socks5ReplyCode) -> Self {
        code as u8
    }
}

/// Classify a dial error into the reply sent to the client.
///
/// Active refusal and an unreachable route are reported as such; every other
/// failure, timeouts included, becomes "host unreachable".
impl From<&io::Error> for Socks5ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Socks5ReplyCode::ConnectionRefused,
            io::ErrorKind::NetworkUnreachable => Socks5ReplyCode::NetworkUnreachable,
            _ => Socks5ReplyCode::HostUnreachable,
        }
    }
}
