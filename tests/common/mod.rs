//! Test utilities and mocks for socks5d
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use socks5d::socks::{ClientConn, Dialer, Resolver, TargetConn};
use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{duplex, AsyncRead, AsyncWrite, DuplexStream, ReadBuf, WriteHalf};
use tokio::net::TcpListener;

/// Address every [`MockTarget`] reports as its local address
pub const MOCK_TARGET_LOCAL_ADDR: &str = "10.0.0.2:40000";

/// Address every [`MockClient`] reports as its peer
pub const MOCK_CLIENT_PEER_ADDR: &str = "192.0.2.10:51000";

/// Create a pair of connected duplex streams for testing
pub fn create_mock_stream_pair() -> (DuplexStream, DuplexStream) {
    duplex(64 * 1024)
}

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Counts how many times a connection double has been dropped
#[derive(Debug, Clone, Default)]
pub struct DropCounter(Arc<AtomicUsize>);

impl DropCounter {
    /// Number of drops so far
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory outbound connection handed out by [`MockDialer`]
#[derive(Debug)]
pub struct MockTarget {
    inner: DuplexStream,
    drops: DropCounter,
}

impl MockTarget {
    /// Create a target and the remote end the test drives
    pub fn pair(drops: DropCounter) -> (MockTarget, DuplexStream) {
        let (inner, remote) = create_mock_stream_pair();
        (MockTarget { inner, drops }, remote)
    }
}

impl Drop for MockTarget {
    fn drop(&mut self) {
        self.drops.record();
    }
}

impl AsyncRead for MockTarget {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockTarget {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl TargetConn for MockTarget {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(MOCK_TARGET_LOCAL_ADDR.parse().unwrap())
    }
}

/// Client write side handed to the request handler
#[derive(Debug)]
pub struct MockClient {
    inner: WriteHalf<DuplexStream>,
    drops: DropCounter,
}

impl MockClient {
    /// Wrap the write half of the proxy side of a client stream
    pub fn new(inner: WriteHalf<DuplexStream>, drops: DropCounter) -> Self {
        MockClient { inner, drops }
    }
}

impl Drop for MockClient {
    fn drop(&mut self) {
        self.drops.record();
    }
}

impl AsyncWrite for MockClient {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl ClientConn for MockClient {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Ok(MOCK_CLIENT_PEER_ADDR.parse().unwrap())
    }
}

/// Client whose connection is already gone: every write fails
#[derive(Debug)]
pub struct BrokenClient {
    drops: DropCounter,
}

impl BrokenClient {
    /// Create a broken client counting its drops in `drops`
    pub fn new(drops: DropCounter) -> Self {
        BrokenClient { drops }
    }
}

impl Drop for BrokenClient {
    fn drop(&mut self) {
        self.drops.record();
    }
}

impl AsyncWrite for BrokenClient {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl ClientConn for BrokenClient {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        Ok(MOCK_CLIENT_PEER_ADDR.parse().unwrap())
    }
}

#[derive(Debug)]
enum DialOutcome {
    Fail(io::ErrorKind),
    Connect(Option<MockTarget>),
}

/// Dialer double that either fails with a fixed error kind or hands out a
/// single prepared [`MockTarget`]
#[derive(Debug)]
pub struct MockDialer {
    outcome: Mutex<DialOutcome>,
    dialed: Arc<Mutex<Vec<SocketAddr>>>,
}

impl MockDialer {
    /// Dialer whose every attempt fails with `kind`
    pub fn failing(kind: io::ErrorKind) -> Self {
        MockDialer {
            outcome: Mutex::new(DialOutcome::Fail(kind)),
            dialed: Arc::default(),
        }
    }

    /// Dialer whose first attempt returns `target`
    pub fn connecting(target: MockTarget) -> Self {
        MockDialer {
            outcome: Mutex::new(DialOutcome::Connect(Some(target))),
            dialed: Arc::default(),
        }
    }

    /// Shared log of the addresses dialed so far
    pub fn dialed(&self) -> Arc<Mutex<Vec<SocketAddr>>> {
        self.dialed.clone()
    }
}

#[async_trait]
impl Dialer for MockDialer {
    type Conn = MockTarget;

    async fn dial(&self, addr: SocketAddr) -> io::Result<MockTarget> {
        self.dialed.lock().unwrap().push(addr);

        let mut outcome = self.outcome.lock().unwrap();
        match &mut *outcome {
            DialOutcome::Fail(kind) => Err(io::Error::new(*kind, "mock dial failure")),
            DialOutcome::Connect(target) => target
                .take()
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mock target already used")),
        }
    }
}

/// Resolver double backed by a fixed table
#[derive(Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<String, IpAddr>,
}

impl StaticResolver {
    /// Add a name to the table
    pub fn with_entry(mut self, name: &str, ip: IpAddr) -> Self {
        self.entries.insert(name.to_string(), ip);
        self
    }
}

#[async_trait]
impl Resolver for StaticResolver {
    async fn resolve(&self, name: &str) -> io::Result<IpAddr> {
        self.entries.get(name).copied().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("unknown name {}", name))
        })
    }
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use socks5d::socks::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a request for `command` to an IPv4 address
    pub fn create_request_ipv4(command: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            command,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        create_request_ipv4(SOCKS5_CMD_TCP_CONNECT, ip, port)
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Reply carrying `code` and the all-zero IPv4 bind address
    pub fn reply_without_bind(code: u8) -> Vec<u8> {
        vec![
            SOCKS5_VERSION,
            code,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
            0,
            0,
            0,
            0,
            0,
            0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_mock_stream_pair() {
        let (mut a, mut b) = create_mock_stream_pair();

        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        a.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        b.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_drop_counter() {
        let drops = DropCounter::default();
        let (target, _remote) = MockTarget::pair(drops.clone());
        assert_eq!(drops.count(), 0);
        drop(target);
        assert_eq!(drops.count(), 1);
    }
}
