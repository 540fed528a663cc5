//! SOCKS5 server
//!
//! Accepts client connections and drives each one through the greeting,
//! request parsing and the request handler on its own task.

use crate::config::Config;
use crate::socks::{negotiate, parse_request, Dialer, Resolver, Socks5Handler};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Bind the configured listen address and serve until shutdown
pub async fn run_server(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;

    info!("Listening on {}", listener.local_addr()?);

    let handler = Arc::new(Socks5Handler::from_config(&config.server.socks));
    serve(listener, handler, shutdown_rx).await
}

/// Accept connections on `listener` until a shutdown signal arrives
///
/// Each accepted connection is handled on its own task. Connections already
/// in flight are not cancelled by shutdown.
pub async fn serve<D, N>(
    listener: TcpListener,
    handler: Arc<Socks5Handler<D, N>>,
    mut shutdown_rx: broadcast::Receiver<bool>,
) -> Result<()>
where
    D: Dialer,
    N: Resolver,
{
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!("Accepted connection from {}", peer);
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &handler).await {
                                warn!("Connection from {} failed: {:#}", peer, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Failed to accept connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping server");
                break;
            }
        }
    }

    Ok(())
}

/// Run one client connection from greeting to the end of its request
pub async fn handle_connection<D, N>(
    mut stream: TcpStream,
    handler: &Socks5Handler<D, N>,
) -> Result<()>
where
    D: Dialer,
    N: Resolver,
{
    negotiate(&mut stream)
        .await
        .context("SOCKS5 method selection failed")?;

    let (reader, writer) = stream.into_split();

    let request = parse_request(reader)
        .await
        .context("Failed to parse SOCKS5 request")?;

    let dest = request.dest.to_string();
    handler
        .handle_request(request, writer)
        .await
        .with_context(|| format!("SOCKS5 request to {} failed", dest))?;

    Ok(())
}
