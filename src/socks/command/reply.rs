//! SOCKS5 reply helpers
//!
//! Thin wrappers around [`send_reply`] for the replies the handler sends.

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::codec::send_reply;
use crate::socks::types::TargetAddr;
use tokio::io::AsyncWrite;
use tracing::warn;

/// Send a success reply carrying the bound address
pub async fn send_success<W>(
    writer: &mut W,
    bind_addr: Option<&TargetAddr>,
) -> Result<(), Socks5Error>
where
    W: AsyncWrite + Unpin,
{
    send_reply(writer, Socks5ReplyCode::Succeeded, bind_addr).await
}

/// Send a "command not supported" reply
pub async fn send_command_not_supported<W>(writer: &mut W) -> Result<(), Socks5Error>
where
    W: AsyncWrite + Unpin,
{
    send_reply(writer, Socks5ReplyCode::CommandNotSupported, None).await
}

/// Answer a failed request and hand back the error that caused it
///
/// The reply is best effort: if writing it fails the write error is logged
/// and `cause` is still returned.
pub async fn send_failure<W>(
    writer: &mut W,
    reply_code: Socks5ReplyCode,
    cause: Socks5Error,
) -> Socks5Error
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = send_reply(writer, reply_code, None).await {
        warn!("Failed to send {:?} reply: {}", reply_code, e);
    }
    cause
}
