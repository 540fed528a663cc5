//! SOCKS5 request handler
//!
//! Takes a parsed request through resolution, command dispatch and, for
//! CONNECT, the dial, the reply and the relay.
//!
//! # Request Flow
//!
//! 1. Resolve a domain destination (reply "host unreachable" on failure)
//! 2. Dispatch on the command
//! 3. CONNECT: dial, reply with the outcome, relay on success
//! 4. BIND, UDP ASSOCIATE and unknown commands: reply "command not supported"

use crate::config::SocksConfig;
use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::command::{send_command_not_supported, send_failure, send_success};
use crate::socks::dial::{ClientConn, Dialer, Resolver, SystemResolver, TargetConn, TcpDialer};
use crate::socks::tcp_relay::relay;
use crate::socks::types::{Request, SocksCommand, TargetAddr};
use std::net::SocketAddr;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

/// SOCKS5 request handler, generic over how it dials and resolves
#[derive(Debug, Clone)]
pub struct Socks5Handler<D = TcpDialer, N = SystemResolver> {
    dialer: D,
    resolver: N,
}

impl Socks5Handler {
    /// Create a handler that dials directly over TCP and resolves with the
    /// system resolver
    pub fn from_config(config: &SocksConfig) -> Self {
        Socks5Handler::new(TcpDialer::from_config(config), SystemResolver)
    }
}

impl<D: Dialer, N: Resolver> Socks5Handler<D, N> {
    /// Create a handler with the given dial and resolve strategies
    pub fn new(dialer: D, resolver: N) -> Self {
        Socks5Handler { dialer, resolver }
    }

    /// Handle one parsed request on a client connection
    ///
    /// Returns `Ok(())` after a CONNECT relay finished cleanly and after an
    /// unsupported BIND or UDP ASSOCIATE was answered. Every failure after
    /// parsing has already been answered with a reply (best effort) by the
    /// time the error is returned.
    pub async fn handle_request<R, C>(
        &self,
        mut request: Request<R>,
        mut conn: C,
    ) -> Result<(), Socks5Error>
    where
        R: AsyncRead + Unpin + Send,
        C: ClientConn,
    {
        match conn.peer_addr() {
            Ok(peer) => info!(
                "SOCKS5 {} request from {} to {}",
                request.command, peer, request.dest
            ),
            Err(_) => info!("SOCKS5 {} request to {}", request.command, request.dest),
        }

        let resolved = match self.resolve(&request.dest).await {
            Ok(addr) => addr,
            Err(e) => {
                warn!("{}", e);
                return Err(send_failure(&mut conn, Socks5ReplyCode::HostUnreachable, e).await);
            }
        };
        request.resolved = Some(resolved);

        let command = request.command;
        match command {
            SocksCommand::Connect => self.handle_connect(request, resolved, conn).await,
            SocksCommand::Bind | SocksCommand::UdpAssociate => {
                warn!("{} command not supported", command);
                send_command_not_supported(&mut conn).await
            }
            SocksCommand::Unknown(byte) => {
                warn!("Unknown command: {:#04x}", byte);
                send_command_not_supported(&mut conn).await?;
                Err(Socks5Error::CommandNotSupported(byte))
            }
        }
    }

    /// Resolve the destination to a socket address, keeping the port
    async fn resolve(&self, dest: &TargetAddr) -> Result<SocketAddr, Socks5Error> {
        match dest {
            TargetAddr::Ip(addr) => Ok(*addr),
            TargetAddr::Domain(domain, port) => {
                let ip = self.resolver.resolve(domain).await.map_err(|source| {
                    Socks5Error::ResolveFailed {
                        domain: domain.clone(),
                        source,
                    }
                })?;
                debug!("Resolved {} to {}", domain, ip);
                Ok(SocketAddr::new(ip, *port))
            }
        }
    }

    /// Handle TCP CONNECT command
    async fn handle_connect<R, C>(
        &self,
        request: Request<R>,
        target_addr: SocketAddr,
        mut conn: C,
    ) -> Result<(), Socks5Error>
    where
        R: AsyncRead + Unpin + Send,
        C: ClientConn,
    {
        debug!("Connecting to target: {}", target_addr);

        let mut target = match self.dialer.dial(target_addr).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to connect to {}: {}", target_addr, e);
                let reply_code = Socks5ReplyCode::from(&e);
                let cause = Socks5Error::ConnectFailed {
                    target: request.dest.to_string(),
                    source: e,
                };
                return Err(send_failure(&mut conn, reply_code, cause).await);
            }
        };

        let bind_addr = target.local_addr().ok().map(TargetAddr::from);
        if let Err(e) = send_success(&mut conn, bind_addr.as_ref()).await {
            drop(target);
            return Err(e);
        }

        info!("SOCKS5 tunnel established to {}", target_addr);

        let mut reader = request.into_reader();
        let result = relay(&mut reader, &mut conn, &mut target).await;

        drop(target);
        drop(conn);
        debug!("SOCKS5 tunnel to {} closed", target_addr);

        result
    }
}
