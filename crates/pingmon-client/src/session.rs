// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The ping session state machine.
//!
//! A [`PingSession`] owns one raw socket and tracks exactly one outstanding
//! Echo Request to one IPv4 host. The owner drives it by calling
//! [`poll`](PingSession::poll) with the current time in milliseconds; every
//! call returns promptly with one [`Outcome`].
//!
//! # Examples
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//! use std::time::{Duration, Instant};
//! use ping_client::session::{Outcome, PingSession};
//! use ping_client::config::PingConfig;
//!
//! # fn main() -> std::io::Result<()> {
//! let config = PingConfig::new(Ipv4Addr::new(192, 0, 2, 1), Duration::from_secs(1));
//! let mut session = PingSession::open(config)?;
//! let start = Instant::now();
//! loop {
//!     let now_ms = start.elapsed().as_millis() as u64;
//!     match session.poll(now_ms) {
//!         Outcome::Reply { latency_ms } => println!("reply in {latency_ms} ms"),
//!         Outcome::Timeout => println!("timed out, resent"),
//!         Outcome::Waiting => {}
//!         Outcome::Errno(e) => eprintln!("socket error: {e}"),
//!         Outcome::Fatal(reason) => return Err(reason.into()),
//!     }
//!     std::thread::sleep(Duration::from_millis(100));
//! }
//! # }
//! ```

use std::fmt;
use std::io;
use std::net::Ipv4Addr;

use log::{debug, trace, warn};
use ping_proto::{
    build_echo_request, extract_echo_reply, verify_checksum, ConstPackedSizeBytes, EchoHeader,
    EchoPacket,
};
use rand::RngCore;

use crate::config::PingConfig;
use crate::error::{BadPacketReason, FatalReason};
use crate::receive::{receive_truncated, Datagram, DrainFailure, Truncated, RECEIVE_BUFFER_LEN};
use crate::transport::{self, IcmpTransport, RawSocket, SendError};

/// The result of one [`PingSession::poll`] call.
#[derive(Debug)]
pub enum Outcome {
    /// The awaited reply arrived `latency_ms` after its request was sent.
    Reply {
        /// Round-trip time in milliseconds.
        latency_ms: u64,
    },
    /// The previous request timed out and a new one was sent.
    Timeout,
    /// A request is outstanding and nothing conclusive has arrived yet.
    Waiting,
    /// The OS reported a socket error. The session remains usable.
    Errno(io::Error),
    /// The input could not be handled. The session should be recreated.
    Fatal(FatalReason),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Reply { latency_ms } => write!(f, "reply in {latency_ms} ms"),
            Outcome::Timeout => write!(f, "timeout"),
            Outcome::Waiting => write!(f, "waiting"),
            Outcome::Errno(e) => write!(f, "socket error: {e}"),
            Outcome::Fatal(reason) => write!(f, "fatal: {reason}"),
        }
    }
}

/// How a single inbound datagram (or its absence) was judged.
#[derive(Debug)]
pub enum Classification {
    /// Nothing queued; the drain loop stops.
    Waiting,
    /// Length, checksum, or drain failure; discarded.
    BadPacket(BadPacketReason),
    /// Well-formed ICMP that is not the awaited reply; discarded.
    OtherPacket(EchoHeader),
    /// Sent by a host other than the configured remote; discarded.
    BadSourceAddress(Ipv4Addr),
    /// The awaited Echo Reply.
    Reply,
    /// A socket error other than would-block.
    Errno(io::Error),
    /// An input this implementation refuses to handle.
    Fatal(FatalReason),
}

/// Per-session counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SessionStats {
    /// Requests handed to the OS in full, resends included.
    pub requests_sent: u64,
    /// Matching replies received.
    pub replies: u64,
    /// Requests that timed out and were resent.
    pub timeouts: u64,
    /// Datagrams dropped for length, checksum, or drain failures.
    pub bad_packets: u64,
    /// Well-formed ICMP messages that were not the awaited reply.
    pub other_packets: u64,
    /// Datagrams from a source other than the remote.
    pub bad_source: u64,
    /// Bytes thrown away while draining oversized datagrams.
    pub bytes_discarded: u64,
}

/// One ping client instance tracking at most one outstanding request.
#[derive(Debug)]
pub struct PingSession<T = RawSocket> {
    transport: T,
    identifier: u16,
    sequence: u16,
    timeout_ms: u64,
    last_send_time: u64,
    remote: Ipv4Addr,
    waiting: bool,
    max_datagrams_per_poll: usize,
    discard_budget: usize,
    stats: SessionStats,
}

impl PingSession<RawSocket> {
    /// Open a raw socket and create a session from `config`.
    ///
    /// The identifier is drawn from the thread-local RNG.
    pub fn open(config: PingConfig) -> io::Result<Self> {
        let socket = RawSocket::open(Some(config.effective_receive_timeout()))?;
        Ok(PingSession::with_transport(socket, config, &mut rand::rng()))
    }
}

impl<T: IcmpTransport> PingSession<T> {
    /// Create a session over an already-configured transport.
    ///
    /// `rng` supplies the two bytes of the session identifier.
    pub fn with_transport<R: RngCore + ?Sized>(transport: T, config: PingConfig, rng: &mut R) -> Self {
        let identifier = random_identifier(rng);
        debug!(
            "ping session for {} (identifier {identifier:#06x}, timeout {:?})",
            config.remote, config.timeout
        );
        PingSession {
            transport,
            identifier,
            sequence: 0,
            timeout_ms: config.timeout_ms(),
            last_send_time: 0,
            remote: config.remote,
            waiting: false,
            max_datagrams_per_poll: config.max_datagrams_per_poll.max(1),
            discard_budget: config.discard_budget,
            stats: SessionStats::default(),
        }
    }

    /// Advance the session.
    ///
    /// - With no request outstanding, sends one and returns [`Outcome::Waiting`].
    /// - If the outstanding request is older than the timeout, sends a new one
    ///   (with a new sequence number) and returns [`Outcome::Timeout`].
    /// - Otherwise reads every queued datagram until the awaited reply, an
    ///   error, or an empty socket.
    ///
    /// Fragmentation is checked before the source address, so a fragmented
    /// datagram from any host ends the session with
    /// [`FatalReason::Fragmented`].
    ///
    /// Send failures are returned without changing state.
    pub fn poll(&mut self, now_ms: u64) -> Outcome {
        if !self.waiting {
            return match self.send_request(now_ms) {
                Ok(()) => {
                    self.waiting = true;
                    Outcome::Waiting
                }
                Err(outcome) => outcome,
            };
        }

        if now_ms > self.last_send_time.saturating_add(self.timeout_ms) {
            debug!(
                "no reply to {} seq {} within {} ms, resending",
                self.remote, self.sequence, self.timeout_ms
            );
            return match self.send_request(now_ms) {
                Ok(()) => {
                    self.stats.timeouts += 1;
                    Outcome::Timeout
                }
                Err(outcome) => outcome,
            };
        }

        for _ in 0..self.max_datagrams_per_poll {
            match self.listen() {
                Classification::Waiting => return Outcome::Waiting,
                Classification::Reply => {
                    self.waiting = false;
                    self.stats.replies += 1;
                    return self.latency(now_ms);
                }
                Classification::BadPacket(reason) => {
                    debug!("discarding datagram: {reason}");
                    self.stats.bad_packets += 1;
                }
                Classification::OtherPacket(header) => {
                    trace!(
                        "ignoring ICMP type {} id {:#06x} seq {}",
                        header.icmp_type, header.identifier, header.sequence
                    );
                    self.stats.other_packets += 1;
                }
                Classification::BadSourceAddress(source) => {
                    trace!("ignoring datagram from {source}");
                    self.stats.bad_source += 1;
                }
                Classification::Errno(e) => return Outcome::Errno(e),
                Classification::Fatal(reason) => {
                    warn!("ping session for {} cannot continue: {reason}", self.remote);
                    return Outcome::Fatal(reason);
                }
            }
        }
        trace!(
            "inspected {} datagrams this poll, deferring the rest",
            self.max_datagrams_per_poll
        );
        Outcome::Waiting
    }

    /// Build and send the next request. On success the sequence number and
    /// send time are committed.
    fn send_request(&mut self, now_ms: u64) -> Result<(), Outcome> {
        let sequence = self.sequence.wrapping_add(1);
        let packet = build_echo_request(sequence, self.identifier);
        match transport::send(&mut self.transport, &packet, self.remote) {
            Ok(_) => {
                self.sequence = sequence;
                self.last_send_time = now_ms;
                self.stats.requests_sent += 1;
                trace!("echo request seq {sequence} to {} at {now_ms} ms", self.remote);
                Ok(())
            }
            Err(SendError::Io(e)) => {
                debug!("echo request to {} failed: {e}", self.remote);
                Err(Outcome::Errno(e))
            }
            Err(SendError::Partial { sent, expected }) => {
                Err(Outcome::Fatal(FatalReason::PartialSend { sent, expected }))
            }
        }
    }

    /// Receive and classify one datagram.
    fn listen(&mut self) -> Classification {
        let mut buf = [0u8; RECEIVE_BUFFER_LEN];
        let datagram = match receive_truncated(&mut self.transport, &mut buf, self.discard_budget) {
            Truncated::Complete(datagram) => datagram,
            Truncated::Empty => return Classification::Waiting,
            Truncated::Error(e) => return Classification::Errno(e),
            Truncated::Malformed(e) => {
                return Classification::BadPacket(BadPacketReason::MalformedHeader(e));
            }
            Truncated::Fragmented(header) => {
                return Classification::Fatal(FatalReason::Fragmented {
                    source: header.source,
                });
            }
            Truncated::OverBudget {
                source,
                remaining,
                budget,
            } => {
                return Classification::Fatal(FatalReason::DrainBudgetExceeded {
                    source,
                    remaining,
                    budget,
                });
            }
            Truncated::DrainFailed {
                discarded,
                failure: DrainFailure::Io(e),
                ..
            } => {
                self.stats.bytes_discarded += discarded as u64;
                return Classification::Fatal(FatalReason::DrainInterrupted {
                    discarded,
                    kind: e.kind(),
                });
            }
            Truncated::DrainFailed {
                discarded, failure, ..
            } => {
                self.stats.bytes_discarded += discarded as u64;
                return Classification::BadPacket(BadPacketReason::Drain { discarded, failure });
            }
        };
        self.stats.bytes_discarded += datagram.discarded as u64;
        classify_datagram(
            &buf[..datagram.read],
            &datagram,
            self.remote,
            self.identifier,
            self.sequence,
        )
    }

    fn latency(&self, now_ms: u64) -> Outcome {
        match now_ms.checked_sub(self.last_send_time) {
            Some(latency_ms) => Outcome::Reply { latency_ms },
            None => Outcome::Fatal(FatalReason::ClockWentBackwards {
                now_ms,
                last_send_time: self.last_send_time,
            }),
        }
    }
}

impl<T> PingSession<T> {
    /// The identifier carried by every request of this session.
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    /// The sequence number of the most recent request (0 before the first).
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// When the most recent request was sent, in the caller's milliseconds.
    pub fn last_send_time(&self) -> u64 {
        self.last_send_time
    }

    /// Whether a request is outstanding.
    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// The host this session pings.
    pub fn remote(&self) -> Ipv4Addr {
        self.remote
    }

    /// The reply timeout in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Counters accumulated since the session was created.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The underlying transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Draw a 16-bit identifier from a random-bytes provider.
pub fn random_identifier<R: RngCore + ?Sized>(rng: &mut R) -> u16 {
    let mut bytes = [0u8; 2];
    rng.fill_bytes(&mut bytes);
    u16::from_ne_bytes(bytes)
}

/// Classify a received datagram whose header parsed and whose tail was drained.
///
/// `bytes` is what was read into the receive buffer. Checksums are verified
/// before any ICMP field is looked at.
pub fn classify_datagram(
    bytes: &[u8],
    datagram: &Datagram,
    remote: Ipv4Addr,
    identifier: u16,
    sequence: u16,
) -> Classification {
    if datagram.source != remote {
        return Classification::BadSourceAddress(datagram.source);
    }

    let header_length = datagram.header.header_length;
    let expected = header_length + EchoPacket::PACKED_SIZE_BYTES;
    if datagram.total_length != expected || datagram.read != expected || bytes.len() != expected {
        return Classification::BadPacket(BadPacketReason::LengthMismatch {
            expected,
            declared: datagram.total_length,
            read: datagram.read,
        });
    }

    if !verify_checksum(bytes, header_length) {
        return Classification::BadPacket(BadPacketReason::HeaderChecksum);
    }
    let icmp_valid = bytes
        .get(header_length..)
        .is_some_and(|icmp| verify_checksum(icmp, EchoPacket::PACKED_SIZE_BYTES));
    if !icmp_valid {
        return Classification::BadPacket(BadPacketReason::IcmpChecksum);
    }

    let packet = match extract_echo_reply(bytes, header_length) {
        Ok(packet) => packet,
        Err(_) => {
            return Classification::Fatal(FatalReason::ExtractionOutOfBounds {
                header_length,
                available: bytes.len(),
            });
        }
    };

    let header = packet.header;
    if !header.is_echo_reply() || header.identifier != identifier || header.sequence != sequence {
        return Classification::OtherPacket(header);
    }
    Classification::Reply
}
