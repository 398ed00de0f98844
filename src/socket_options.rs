//! Socket option tuning, applied at bind/accept time.
//!
//! Grounded on `lib/http/source/socket-options.c` (`SO_RCVBUF`,
//! `SO_SNDBUF`, `SO_BROADCAST`, `SO_KEEPALIVE`) and
//! `socket-options-inet.c` (TCP keepalive tuning, `IP_TTL`/`IP_TOS`/
//! `IP_FREEBIND`, multicast membership). `std::net` exposes none of
//! these, so this module reaches for `socket2` the same way the pack's
//! `hyperium-hyper` does for its listener setup.

use std::net::IpAddr;
use std::time::Duration;

use socket2::Socket;

/// Direction a socket is used in, mirroring `_AFSocketDirection`: some
/// options only make sense on the receiving or sending side of a
/// connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub recv: bool,
    pub send: bool,
}

impl Direction {
    pub const BOTH: Direction = Direction { recv: true, send: true };
}

/// Socket tuning knobs applied at bind/accept time. Every field is
/// optional; `None`/`0` means "leave the OS default alone".
#[derive(Debug, Clone, Default)]
pub struct SocketOptions {
    pub so_rcvbuf: Option<usize>,
    pub so_sndbuf: Option<usize>,
    pub so_broadcast: bool,
    pub so_keepalive: bool,
    pub tcp_keepalive_time: Option<Duration>,
    pub tcp_keepalive_probes: Option<u32>,
    pub tcp_keepalive_interval: Option<Duration>,
    pub ip_ttl: Option<u32>,
    pub ip_tos: Option<u32>,
    pub ip_freebind: bool,
}

impl SocketOptions {
    /// Defaults matching `_socket_options_inet_new_instance`: keepalive
    /// on, with 60s/6-probes/10s timing where the platform allows it.
    pub fn inet_defaults() -> SocketOptions {
        SocketOptions {
            so_keepalive: true,
            tcp_keepalive_time: Some(Duration::from_secs(60)),
            tcp_keepalive_probes: Some(6),
            tcp_keepalive_interval: Some(Duration::from_secs(10)),
            ..SocketOptions::default()
        }
    }

    /// Apply every configured option to `socket`. Mirrors
    /// `_socket_options_setup_socket_method` plus the INET overlay:
    /// buffer sizes and broadcast are best-effort (warn-only in the C
    /// original; here they bubble up so the caller can log), keepalive
    /// is unconditional, and multicast membership is joined only when
    /// `bind_addr` is a multicast address and `dir.recv` is set.
    pub fn apply(&self, socket: &Socket, dir: Direction, bind_addr: Option<IpAddr>) -> std::io::Result<()> {
        if dir.recv {
            if let Some(n) = self.so_rcvbuf {
                socket.set_recv_buffer_size(n)?;
            }
        }
        if dir.send {
            if let Some(n) = self.so_sndbuf {
                socket.set_send_buffer_size(n)?;
            }
            if self.so_broadcast {
                socket.set_broadcast(true)?;
            }
        }
        socket.set_keepalive(self.so_keepalive)?;

        if self.so_keepalive {
            apply_tcp_keepalive(socket, self)?;
        }

        if let Some(addr) = bind_addr {
            self.apply_ip_options(socket, dir, addr)?;
        }

        Ok(())
    }

    fn apply_ip_options(&self, socket: &Socket, dir: Direction, addr: IpAddr) -> std::io::Result<()> {
        match addr {
            IpAddr::V4(v4) if v4.is_multicast() => {
                if dir.recv {
                    socket.join_multicast_v4(&v4, &std::net::Ipv4Addr::UNSPECIFIED)?;
                    socket.set_multicast_loop_v4(false)?;
                }
                if dir.send {
                    if let Some(ttl) = self.ip_ttl {
                        socket.set_multicast_ttl_v4(ttl)?;
                    }
                }
            }
            IpAddr::V4(_) => {
                if dir.send {
                    if let Some(ttl) = self.ip_ttl {
                        socket.set_ttl(ttl)?;
                    }
                    if let Some(tos) = self.ip_tos {
                        socket.set_tos(tos)?;
                    }
                }
            }
            IpAddr::V6(v6) if v6.is_multicast() => {
                if dir.recv {
                    socket.join_multicast_v6(&v6, 0)?;
                    socket.set_multicast_loop_v6(false)?;
                }
                if dir.send {
                    if let Some(ttl) = self.ip_ttl {
                        socket.set_multicast_hops_v6(ttl)?;
                    }
                }
            }
            IpAddr::V6(_) => {
                if dir.send {
                    if let Some(ttl) = self.ip_ttl {
                        socket.set_unicast_hops_v6(ttl)?;
                    }
                }
            }
        }
        if self.ip_freebind && dir.recv {
            socket.set_freebind(true)?;
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn apply_tcp_keepalive(socket: &Socket, opts: &SocketOptions) -> std::io::Result<()> {
    let mut params = socket2::TcpKeepalive::new();
    if let Some(t) = opts.tcp_keepalive_time {
        params = params.with_time(t);
    }
    if let Some(n) = opts.tcp_keepalive_probes {
        params = params.with_retries(n);
    }
    if let Some(i) = opts.tcp_keepalive_interval {
        params = params.with_interval(i);
    }
    socket.set_tcp_keepalive(&params)
}

#[cfg(not(target_os = "linux"))]
fn apply_tcp_keepalive(socket: &Socket, opts: &SocketOptions) -> std::io::Result<()> {
    let mut params = socket2::TcpKeepalive::new();
    if let Some(t) = opts.tcp_keepalive_time {
        params = params.with_time(t);
    }
    if let Some(i) = opts.tcp_keepalive_interval {
        params = params.with_interval(i);
    }
    socket.set_tcp_keepalive(&params)
}

#[cfg(test)]
mod test {
    use super::*;
    use socket2::{Domain, Socket, Type};

    #[test]
    fn defaults_apply_without_error_on_loopback_socket() {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, None).unwrap();
        let opts = SocketOptions::inet_defaults();
        opts.apply(&socket, Direction::BOTH, Some(IpAddr::V4(std::net::Ipv4Addr::LOCALHOST))).unwrap();
    }

    #[test]
    fn freebind_is_opt_in() {
        let opts = SocketOptions::default();
        assert!(!opts.ip_freebind);
    }
}
