//! SOCKS5 command parser
//!
//! Parses SOCKS5 command requests from the client.

use crate::error::Socks5Error;
use crate::socks::codec::read_address;
use crate::socks::consts::*;
use crate::socks::types::{Request, SocksCommand};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Parse a SOCKS5 request from the stream
///
/// # SOCKS5 Request Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Nothing is written back on failure: a malformed request is not answered.
/// The reader is returned inside the [`Request`], positioned right after the
/// destination port.
pub async fn parse_request<R>(mut reader: R) -> Result<Request<R>, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    // Read: VER CMD RSV
    let mut header = [0u8; 3];
    reader.read_exact(&mut header).await?;

    let version = header[0];
    let cmd_byte = header[1];

    if version != SOCKS5_VERSION {
        return Err(Socks5Error::UnsupportedVersion(version));
    }

    let command = SocksCommand::from_byte(cmd_byte);
    let dest = read_address(&mut reader).await?;

    tracing::debug!("Parsed SOCKS5 command: {} to {}", command, dest);

    Ok(Request::new(command, dest, reader))
}
