use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::time::{SystemTime, UNIX_EPOCH};

use log::trace;
use socket2::Socket;

use crate::error::SendError;
use crate::icmp;

/// Resolve um nome ou endereço literal para IPv4 usando o resolvedor da plataforma.
pub fn resolve_ipv4(destination: &str) -> Result<Ipv4Addr, SendError> {
    if let Ok(ip) = destination.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let addrs = (destination, 0u16)
        .to_socket_addrs()
        .map_err(|source| SendError::Resolve { destination: destination.to_owned(), source })?;
    addrs
        .filter_map(|a| match a {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| SendError::NoIpv4Address { destination: destination.to_owned() })
}

/// Segundos desde a época Unix, como vai no início do payload ICMP.
fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Envia um Echo Request com `payload` para `destination`.
///
/// Um pacote por chamada, sem retransmissão.
pub fn send_one(
    socket: &Socket,
    destination: &str,
    ident: u16,
    seq: u16,
    payload: &[u8],
) -> Result<(), SendError> {
    let ip = resolve_ipv4(destination)?;
    let pkt = icmp::build_echo_request(ident, seq, now_timestamp(), payload);

    // Porta 0 é ignorada para ICMP, mas a API de sockets exige uma.
    let dst = SocketAddrV4::new(ip, 0);
    socket.send_to(&pkt, &dst.into()).map_err(SendError::Io)?;

    trace!("echo request -> {} id={} seq={} bytes={}", ip, ident, seq, pkt.len());
    Ok(())
}
