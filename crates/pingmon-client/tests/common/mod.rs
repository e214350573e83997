// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but not every file uses every helper.
#![allow(dead_code, unreachable_pub)]

use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

use ping_client::icmp::ECHO_REPLY;
use ping_client::{IcmpTransport, PingConfig, PingSession};
use ping_proto::{internet_checksum, ConstPackedSizeBytes, EchoPacket, Ipv4Header, ToBytes};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// The host every test session pings.
pub const REMOTE: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 7);

/// Some other host on the network.
pub const OTHER: Ipv4Addr = Ipv4Addr::new(198, 51, 100, 23);

/// Our own address, as it appears in the destination field of replies.
pub const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);

/// Reply timeout used by [`session`].
pub const TIMEOUT: Duration = Duration::from_millis(1000);

enum Inbound {
    Datagram {
        bytes: Vec<u8>,
        source: Ipv4Addr,
        offset: usize,
    },
    Error(io::ErrorKind),
}

/// In-memory raw socket.
///
/// Inbound datagrams are consumed as a byte stream per datagram: a read that
/// takes only part of a datagram leaves the rest for the next read, which is
/// how a drain of the undelivered tail sees it. A datagram is gone once all
/// of its bytes have been read.
#[derive(Default)]
pub struct MockTransport {
    inbound: VecDeque<Inbound>,
    send_results: VecDeque<io::Result<usize>>,
    /// Every packet handed to `send_to` that the mock accepted, in order.
    pub sent: Vec<(Vec<u8>, Ipv4Addr)>,
    /// Number of `recv_from` calls, would-blocks included.
    pub recv_calls: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram as delivered by `source`.
    pub fn push(&mut self, bytes: Vec<u8>, source: Ipv4Addr) {
        self.inbound.push_back(Inbound::Datagram {
            bytes,
            source,
            offset: 0,
        });
    }

    /// Queue a socket error for a future `recv_from`.
    pub fn push_error(&mut self, kind: io::ErrorKind) {
        self.inbound.push_back(Inbound::Error(kind));
    }

    /// Script the result of the next `send_to`. Unscripted sends succeed.
    pub fn script_send(&mut self, result: io::Result<usize>) {
        self.send_results.push_back(result);
    }

    /// Datagrams and errors not yet consumed.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }
}

impl IcmpTransport for MockTransport {
    fn send_to(&mut self, buf: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let sent = self.send_results.pop_front().unwrap_or(Ok(buf.len()))?;
        self.sent.push((buf.to_vec(), destination));
        Ok(sent)
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        self.recv_calls += 1;
        let (n, source, exhausted) = match self.inbound.front_mut() {
            None => return Err(io::ErrorKind::WouldBlock.into()),
            Some(Inbound::Error(kind)) => {
                let kind = *kind;
                self.inbound.pop_front();
                return Err(io::Error::new(kind, "scripted socket error"));
            }
            Some(Inbound::Datagram {
                bytes,
                source,
                offset,
            }) => {
                let n = (bytes.len() - *offset).min(buf.len());
                buf[..n].copy_from_slice(&bytes[*offset..*offset + n]);
                *offset += n;
                (n, *source, *offset == bytes.len())
            }
        };
        if exhausted {
            self.inbound.pop_front();
        }
        Ok((n, source))
    }
}

/// A session over a fresh [`MockTransport`] pinging [`REMOTE`].
pub fn session() -> PingSession<MockTransport> {
    session_with(PingConfig::new(REMOTE, TIMEOUT))
}

/// A session over a fresh [`MockTransport`] with the given configuration.
pub fn session_with(config: PingConfig) -> PingSession<MockTransport> {
    PingSession::with_transport(MockTransport::new(), config, &mut StdRng::seed_from_u64(0x5eed))
}

/// Builds a raw IPv4 datagram carrying an ICMP echo message, with both
/// checksums correct unless told otherwise.
#[derive(Clone, Debug)]
pub struct ReplyBuilder {
    identifier: u16,
    sequence: u16,
    icmp_type: u8,
    options: usize,
    source: Ipv4Addr,
    flags: u8,
    fragment_offset: u16,
    padding: usize,
    total_length: Option<u16>,
}

impl ReplyBuilder {
    /// An echo reply from [`REMOTE`] for `identifier`/`sequence`.
    pub fn new(identifier: u16, sequence: u16) -> Self {
        ReplyBuilder {
            identifier,
            sequence,
            icmp_type: ECHO_REPLY,
            options: 0,
            source: REMOTE,
            flags: 0,
            fragment_offset: 0,
            padding: 0,
            total_length: None,
        }
    }

    /// A reply to the request `session` currently has outstanding.
    pub fn answering<T>(session: &PingSession<T>) -> Self {
        Self::new(session.identifier(), session.sequence())
    }

    pub fn icmp_type(mut self, icmp_type: u8) -> Self {
        self.icmp_type = icmp_type;
        self
    }

    /// Zero-filled IPv4 options, a multiple of 4 up to 40.
    pub fn options(mut self, len: usize) -> Self {
        self.options = len;
        self
    }

    /// Source address written into the IPv4 header.
    pub fn source(mut self, source: Ipv4Addr) -> Self {
        self.source = source;
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn fragment_offset(mut self, offset: u16) -> Self {
        self.fragment_offset = offset;
        self
    }

    /// Extra bytes after the echo packet, counted in the total length.
    pub fn padding(mut self, len: usize) -> Self {
        self.padding = len;
        self
    }

    /// Declare a total length that differs from the bytes produced.
    pub fn total_length(mut self, len: u16) -> Self {
        self.total_length = Some(len);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_length = 20 + self.options;
        let len = header_length + EchoPacket::PACKED_SIZE_BYTES + self.padding;
        let mut header = Ipv4Header {
            header_length,
            total_length: self.total_length.unwrap_or(len as u16),
            flags: self.flags,
            fragment_offset: self.fragment_offset,
            source: self.source,
            destination: LOCAL,
            ..Ipv4Header::default()
        };
        header.checksum = header.compute_checksum();

        let mut bytes = vec![0u8; len];
        header.to_bytes(&mut bytes).unwrap();

        let mut echo = EchoPacket::request(self.sequence, self.identifier);
        echo.header.icmp_type = self.icmp_type;
        let icmp = &mut bytes[header_length..header_length + 12];
        echo.to_bytes(icmp).unwrap();
        let sum = internet_checksum(icmp);
        icmp[2..4].copy_from_slice(&sum.to_be_bytes());
        bytes
    }
}
