//! SOCKS5 module for socks5d
//!
//! This module implements the SOCKS5 request pipeline: method selection,
//! request parsing, command handling and the CONNECT relay.

mod auth;
mod codec;
mod command;
mod consts;
mod dial;
mod handler;
mod tcp_relay;
mod types;

pub use auth::negotiate;
pub use codec::{encode_reply, read_address, send_reply, write_address};
pub use command::{parse_request, send_command_not_supported, send_failure, send_success};
pub use consts::*;
pub use dial::{
    ClientConn, Dialer, Resolver, SocketOpts, SystemResolver, TargetConn, TcpDialer,
};
pub use handler::Socks5Handler;
pub use tcp_relay::relay;
pub use types::{Request, SocksCommand, TargetAddr};
