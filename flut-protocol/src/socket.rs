//! TCP resolve/connect helpers.

use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::net::{lookup_host, TcpStream};

/// Resolve `host` to a socket address.
///
/// A literal IPv4/IPv6 address takes the fast path and never touches the
/// resolver; anything else goes through name resolution and the first
/// returned address wins.
pub async fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }

    lookup_host((host, port)).await?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses found for {host}"),
        )
    })
}

/// Connect a stream socket to `addr`.
///
/// Nagle's algorithm is disabled: packets are already batched to the wanted
/// granularity and should leave as soon as they are written.
pub async fn connect(addr: SocketAddr) -> io::Result<TcpStream> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}
