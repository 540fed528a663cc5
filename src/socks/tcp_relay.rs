//! TCP relay for SOCKS5 CONNECT command
//!
//! Copies data in both directions between the client and the target until
//! both directions have finished.

use crate::error::Socks5Error;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Relay data bidirectionally between the client and the target
///
/// Each direction copies until its source reaches EOF or fails, then
/// half-closes its destination so the peer sees EOF while the other
/// direction keeps flowing. Both outcomes are always collected; the first
/// error to arrive is returned.
///
/// The streams are borrowed: closing them is left to the caller.
pub async fn relay<R, W, T>(
    client_reader: &mut R,
    client_writer: &mut W,
    target: &mut T,
) -> Result<(), Socks5Error>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (mut target_reader, mut target_writer) = tokio::io::split(target);

    let upstream = copy_then_shutdown(client_reader, &mut target_writer);
    let downstream = copy_then_shutdown(&mut target_reader, client_writer);
    tokio::pin!(upstream);
    tokio::pin!(downstream);

    let mut upstream_done = false;
    let mut downstream_done = false;
    let mut first_error: Option<io::Error> = None;

    while !(upstream_done && downstream_done) {
        let (direction, result) = tokio::select! {
            result = &mut upstream, if !upstream_done => {
                upstream_done = true;
                ("client->target", result)
            }
            result = &mut downstream, if !downstream_done => {
                downstream_done = true;
                ("target->client", result)
            }
        };

        match result {
            Ok(bytes) => debug!("{} finished: {} bytes", direction, bytes),
            Err(e) => {
                debug!("{} error: {}", direction, e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Copy `reader` into `writer`, then shut down the write side of `writer`
async fn copy_then_shutdown<R, W>(reader: &mut R, writer: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let copied = tokio::io::copy(reader, writer).await;

    // The peer may already be gone; that is not an error of this direction
    if let Err(e) = writer.shutdown().await {
        debug!("Half-close failed: {}", e);
    }

    copied
}
