// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Raw IPv4 socket creation and the send half of the socket adapter.
//!
//! [`IcmpTransport`] is the seam between the session and the OS. [`RawSocket`]
//! implements it over a non-blocking `SOCK_RAW`/`IPPROTO_ICMP` socket created
//! with `socket2`. Tests substitute an in-memory transport.

use std::fmt;
use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use log::{debug, trace};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

/// Datagram I/O against raw IPv4.
///
/// Implementations must never block: a receive with nothing queued returns an
/// error of kind [`io::ErrorKind::WouldBlock`].
pub trait IcmpTransport {
    /// Send `buf` as the payload of one IPv4 datagram to `destination`.
    fn send_to(&mut self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize>;

    /// Receive into `buf`, returning the number of bytes read and the source
    /// address. Inbound data starts with the IPv4 header.
    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)>;
}

impl<T: IcmpTransport + ?Sized> IcmpTransport for &mut T {
    fn send_to(&mut self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        (**self).send_to(buf, destination)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        (**self).recv_from(buf)
    }
}

impl<T: IcmpTransport + ?Sized> IcmpTransport for Box<T> {
    fn send_to(&mut self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        (**self).send_to(buf, destination)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        (**self).recv_from(buf)
    }
}

/// A non-blocking raw ICMP socket, bound to no local address.
///
/// The descriptor is closed when the value is dropped.
#[derive(Debug)]
pub struct RawSocket {
    socket: Socket,
}

impl RawSocket {
    /// Create a raw IPv4 ICMP socket, apply `receive_timeout` as `SO_RCVTIMEO`
    /// and switch it to non-blocking mode.
    ///
    /// Raw sockets usually require elevated privileges (root or
    /// `CAP_NET_RAW`). Any failure is returned and the half-configured socket
    /// is closed.
    pub fn open(receive_timeout: Option<Duration>) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        // A zero SO_RCVTIMEO means "no timeout" to the OS.
        let receive_timeout = receive_timeout.filter(|t| !t.is_zero());
        socket.set_read_timeout(receive_timeout)?;
        socket.set_nonblocking(true)?;
        debug!("opened raw ICMP socket (receive timeout {receive_timeout:?})");
        Ok(RawSocket { socket })
    }
}

impl IcmpTransport for RawSocket {
    fn send_to(&mut self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let addr = SockAddr::from(SocketAddrV4::new(destination, 0));
        self.socket.send_to(buf, &addr)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        // SAFETY: `MaybeUninit<u8>` has the same layout as `u8`, and the
        // buffer is already initialized. `recv_from` only writes bytes into it.
        let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
        let (received, addr) = self.socket.recv_from(uninit)?;
        let source = addr.as_socket_ipv4().map(|a| *a.ip()).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "non-IPv4 source address")
        })?;
        Ok((received, source))
    }
}

/// Why a request could not be sent.
#[derive(Debug)]
pub enum SendError {
    /// The OS rejected the send.
    Io(io::Error),
    /// The OS accepted only part of the packet.
    Partial {
        /// Bytes reported as sent.
        sent: usize,
        /// Bytes in the packet.
        expected: usize,
    },
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Io(e) => write!(f, "send failed: {e}"),
            SendError::Partial { sent, expected } => {
                write!(f, "partial send: {sent} of {expected} bytes")
            }
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::Io(e) => Some(e),
            SendError::Partial { .. } => None,
        }
    }
}

/// Send exactly `packet` to `destination:0`.
///
/// Raw sends to a fixed peer are all-or-nothing at this size, so a short count
/// is reported as [`SendError::Partial`] rather than retried.
pub fn send<T: IcmpTransport + ?Sized>(
    transport: &mut T,
    packet: &[u8],
    destination: Ipv4Addr,
) -> Result<usize, SendError> {
    let sent = transport
        .send_to(packet, destination)
        .map_err(SendError::Io)?;
    if sent != packet.len() {
        return Err(SendError::Partial {
            sent,
            expected: packet.len(),
        });
    }
    trace!("sent {sent} bytes to {destination}");
    Ok(sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSend(io::Result<usize>);

    impl IcmpTransport for FixedSend {
        fn send_to(&mut self, _buf: &[u8], _destination: Ipv4Addr) -> io::Result<usize> {
            match &self.0 {
                Ok(n) => Ok(*n),
                Err(e) => Err(io::Error::new(e.kind(), "scripted")),
            }
        }

        fn recv_from(&mut self, _buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
            Err(io::ErrorKind::WouldBlock.into())
        }
    }

    #[test]
    fn test_send_complete() {
        let mut t = FixedSend(Ok(12));
        assert_eq!(send(&mut t, &[0u8; 12], Ipv4Addr::LOCALHOST).unwrap(), 12);
    }

    #[test]
    fn test_send_partial() {
        let mut t = FixedSend(Ok(5));
        match send(&mut t, &[0u8; 12], Ipv4Addr::LOCALHOST) {
            Err(SendError::Partial { sent, expected }) => {
                assert_eq!(sent, 5);
                assert_eq!(expected, 12);
            }
            other => panic!("expected partial send, got {other:?}"),
        }
    }

    #[test]
    fn test_send_io_error() {
        let mut t = FixedSend(Err(io::ErrorKind::PermissionDenied.into()));
        let err = send(&mut t, &[0u8; 12], Ipv4Addr::LOCALHOST).unwrap_err();
        assert!(matches!(err, SendError::Io(ref e) if e.kind() == io::ErrorKind::PermissionDenied));
        assert!(err.to_string().starts_with("send failed"));
    }

    #[test]
    fn test_boxed_transport_forwards() {
        let mut boxed: Box<dyn IcmpTransport> = Box::new(FixedSend(Ok(12)));
        assert_eq!(send(&mut boxed, &[0u8; 12], Ipv4Addr::LOCALHOST).unwrap(), 12);
        let mut buf = [0u8; 4];
        assert_eq!(
            boxed.recv_from(&mut buf).unwrap_err().kind(),
            io::ErrorKind::WouldBlock
        );
    }

    #[test]
    fn test_open_raw_socket() {
        // Raw sockets need privileges; only assert on the unprivileged error.
        match RawSocket::open(Some(Duration::from_millis(500))) {
            Ok(_) => {}
            Err(e) => assert!(
                matches!(
                    e.kind(),
                    io::ErrorKind::PermissionDenied | io::ErrorKind::Unsupported
                ) || e.raw_os_error().is_some(),
                "unexpected error: {e}"
            ),
        }
    }
}
