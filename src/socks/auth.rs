//! SOCKS5 method selection
//!
//! Only "no authentication required" is offered. Clients that do not list it
//! are told no method is acceptable and the connection is dropped.

use crate::error::Socks5Error;
use crate::socks::consts::*;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Run the greeting on a fresh connection
///
/// ```text
/// +----+----------+----------+      +----+--------+
/// |VER | NMETHODS | METHODS  |  ->  |VER | METHOD |
/// +----+----------+----------+      +----+--------+
/// | 1  |    1     | 1 to 255 |      | 1  |   1    |
/// +----+----------+----------+      +----+--------+
/// ```
pub async fn negotiate<S>(stream: &mut S) -> Result<(), Socks5Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 2];
    stream.read_exact(&mut buf).await?;

    let version = buf[0];
    let num_methods = buf[1];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let mut methods = vec![0u8; num_methods as usize];
    stream.read_exact(&mut methods).await?;

    let accepted = methods.contains(&SOCKS5_AUTH_METHOD_NONE);
    let selected = if accepted {
        SOCKS5_AUTH_METHOD_NONE
    } else {
        SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE
    };

    stream.write_all(&[SOCKS5_VERSION, selected]).await?;
    stream.flush().await?;

    if !accepted {
        return Err(Socks5Error::NoAcceptableMethod);
    }

    tracing::debug!("Authentication completed with method: none");

    Ok(())
}
