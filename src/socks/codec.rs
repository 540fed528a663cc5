//! SOCKS5 address codec
//!
//! Reads and writes the address block shared by requests and replies, and
//! encodes complete reply messages.
//!
//! ```text
//! +------+----------+----------+
//! | ATYP |   ADDR   |   PORT   |
//! +------+----------+----------+
//! |  1   | Variable |    2     |
//! +------+----------+----------+
//! ```

use crate::error::{Socks5Error, Socks5ReplyCode};
use crate::socks::consts::*;
use crate::socks::types::TargetAddr;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Decode an address block from the stream
///
/// An unknown address type fails after consuming only the type byte. A
/// stream that ends early fails with [`io::ErrorKind::UnexpectedEof`], a
/// domain that is not UTF-8 with [`io::ErrorKind::InvalidData`].
pub async fn read_address<R>(reader: &mut R) -> Result<TargetAddr, Socks5Error>
where
    R: AsyncRead + Unpin,
{
    let addr_type = reader.read_u8().await?;

    let addr = match addr_type {
        SOCKS5_ADDR_TYPE_IPV4 => {
            let mut ip = [0u8; 4];
            reader.read_exact(&mut ip).await?;
            let port = reader.read_u16().await?;
            TargetAddr::ipv4(Ipv4Addr::from(ip), port)
        }

        SOCKS5_ADDR_TYPE_DOMAIN => {
            let domain_len = reader.read_u8().await? as usize;
            let mut domain = vec![0u8; domain_len];
            reader.read_exact(&mut domain).await?;
            let port = reader.read_u16().await?;
            let domain = String::from_utf8(domain).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Invalid UTF-8 in domain: {}", e),
                )
            })?;
            TargetAddr::Domain(domain, port)
        }

        SOCKS5_ADDR_TYPE_IPV6 => {
            let mut ip = [0u8; 16];
            reader.read_exact(&mut ip).await?;
            let port = reader.read_u16().await?;
            TargetAddr::ipv6(Ipv6Addr::from(ip), port)
        }

        other => return Err(Socks5Error::UnrecognizedAddressType(other)),
    };

    Ok(addr)
}

/// Append the address block for `addr` to `buf`
///
/// IPv4-mapped IPv6 addresses are written with the IPv4 tag.
pub fn write_address(buf: &mut Vec<u8>, addr: &TargetAddr) -> Result<(), Socks5Error> {
    match addr {
        TargetAddr::Ip(SocketAddr::V4(addr)) => {
            buf.push(SOCKS5_ADDR_TYPE_IPV4);
            buf.extend_from_slice(&addr.ip().octets());
        }
        TargetAddr::Ip(SocketAddr::V6(addr)) => match addr.ip().to_ipv4_mapped() {
            Some(v4) => {
                buf.push(SOCKS5_ADDR_TYPE_IPV4);
                buf.extend_from_slice(&v4.octets());
            }
            None => {
                buf.push(SOCKS5_ADDR_TYPE_IPV6);
                buf.extend_from_slice(&addr.ip().octets());
            }
        },
        TargetAddr::Domain(domain, _) => {
            if domain.len() > MAX_DOMAIN_LEN {
                return Err(Socks5Error::InvalidAddress(format!(
                    "domain name is {} bytes long",
                    domain.len()
                )));
            }
            buf.push(SOCKS5_ADDR_TYPE_DOMAIN);
            buf.push(domain.len() as u8);
            buf.extend_from_slice(domain.as_bytes());
        }
    }
    buf.extend_from_slice(&addr.port().to_be_bytes());

    Ok(())
}

/// Encode a reply message without sending it
///
/// # SOCKS5 Reply Format
///
/// ```text
/// +----+-----+-------+------+----------+----------+
/// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
/// +----+-----+-------+------+----------+----------+
/// | 1  |  1  | X'00' |  1   | Variable |    2     |
/// +----+-----+-------+------+----------+----------+
/// ```
///
/// Without a bound address the block is `0.0.0.0:0`.
pub fn encode_reply(
    reply_code: Socks5ReplyCode,
    bind_addr: Option<&TargetAddr>,
) -> Result<Vec<u8>, Socks5Error> {
    let mut reply = vec![SOCKS5_VERSION, reply_code.into(), SOCKS5_RESERVED];

    match bind_addr {
        Some(addr) => write_address(&mut reply, addr)?,
        None => write_address(&mut reply, &TargetAddr::ipv4(Ipv4Addr::UNSPECIFIED, 0))?,
    }

    Ok(reply)
}

/// Encode and send a reply message
pub async fn send_reply<W>(
    writer: &mut W,
    reply_code: Socks5ReplyCode,
    bind_addr: Option<&TargetAddr>,
) -> Result<(), Socks5Error>
where
    W: AsyncWrite + Unpin,
{
    let reply = encode_reply(reply_code, bind_addr)?;

    writer.write_all(&reply).await?;
    writer.flush().await?;

    Ok(())
}
