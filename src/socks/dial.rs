//! Outbound dialing and name resolution
//!
//! The handler reaches the outside world only through the [`Dialer`] and
//! [`Resolver`] traits, so tests can substitute in-memory implementations.

use crate::config::SocksConfig;
use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;

/// Client side of a SOCKS5 connection as seen by the handler
///
/// Only writing and the peer address are needed; reading happens through
/// the reader held by the parsed request.
pub trait ClientConn: AsyncWrite + Unpin + Send {
    /// Address of the connected client
    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

impl ClientConn for TcpStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }
}

impl ClientConn for OwnedWriteHalf {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        OwnedWriteHalf::peer_addr(self)
    }
}

/// Outbound connection produced by a [`Dialer`]
pub trait TargetConn: AsyncRead + AsyncWrite + Unpin + Send {
    /// Local address the connection is bound to, reported in the success reply
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl TargetConn for TcpStream {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }
}

/// Strategy for opening the outbound connection of a CONNECT request
#[async_trait]
pub trait Dialer: Debug + Send + Sync + 'static {
    /// The connection type produced by this dialer
    type Conn: TargetConn + 'static;

    /// Connect to `addr`
    ///
    /// The error kind decides the reply code sent to the client.
    async fn dial(&self, addr: SocketAddr) -> io::Result<Self::Conn>;
}

/// Strategy for turning a domain name into an IP address
#[async_trait]
pub trait Resolver: Debug + Send + Sync + 'static {
    /// Resolve `name` to a single address
    async fn resolve(&self, name: &str) -> io::Result<IpAddr>;
}

/// Resolver backed by the host's name resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, name: &str) -> io::Result<IpAddr> {
        let mut addrs = tokio::net::lookup_host((name, 0)).await?;
        addrs.next().map(|addr| addr.ip()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("No addresses found for domain: {}", name),
            )
        })
    }
}

/// Socket options for outbound connections
#[derive(Debug, Clone)]
pub struct SocketOpts {
    /// Enable TCP_NODELAY
    pub nodelay: bool,
    /// TCP keepalive timeout
    pub keepalive_secs: Option<u64>,
    /// TCP keepalive interval
    pub keepalive_interval: Option<u64>,
}

impl SocketOpts {
    /// Create socket options from SOCKS5 config
    pub fn from_socks_config(config: &SocksConfig) -> Self {
        SocketOpts {
            nodelay: config.nodelay,
            keepalive_secs: Some(config.keepalive_secs).filter(|secs| *secs > 0),
            keepalive_interval: Some(config.keepalive_interval).filter(|secs| *secs > 0),
        }
    }

    /// Apply socket options to a TCP stream
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let (Some(timeout), Some(interval)) = (self.keepalive_secs, self.keepalive_interval) {
            let socket = socket2::SockRef::from(stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(timeout))
                .with_interval(Duration::from_secs(interval));
            socket.set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Direct TCP dialer
#[derive(Debug, Clone)]
pub struct TcpDialer {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout, `None` waits for the OS
    connect_timeout: Option<Duration>,
}

impl TcpDialer {
    /// Create a TCP dialer from SOCKS5 config
    pub fn from_config(config: &SocksConfig) -> Self {
        TcpDialer {
            socket_opts: SocketOpts::from_socks_config(config),
            connect_timeout: config.connect_timeout_duration(),
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    type Conn = TcpStream;

    async fn dial(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        let stream = match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(addr))
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("Connection timeout to {}", addr),
                    )
                })??,
            None => TcpStream::connect(addr).await?,
        };

        if let Err(e) = self.socket_opts.apply(&stream) {
            tracing::warn!("Failed to apply socket options: {}", e);
        }

        tracing::debug!("TCP connection established to {}", addr);

        Ok(stream)
    }
}
