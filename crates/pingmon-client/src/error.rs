// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error and discard-reason types for the ping client.
//!
//! [`PingSession::poll`](crate::session::PingSession::poll) never returns a
//! `Result`: every path yields an [`Outcome`](crate::session::Outcome). The
//! types here are the payloads of those outcomes.
//!
//! - [`FatalReason`] explains why an input could not be handled at all. The
//!   caller should tear the session down and create a new one.
//! - [`BadPacketReason`] explains why a single datagram was discarded. These
//!   never abort a poll; they are logged and counted.
//!
//! `FatalReason` converts into [`io::Error`] for callers that prefer to
//! propagate it with `?`:
//!
//! ```
//! use std::io;
//! use ping_client::error::FatalReason;
//!
//! let err: io::Error = FatalReason::PartialSend { sent: 4, expected: 12 }.into();
//! assert_eq!(err.kind(), io::ErrorKind::WriteZero);
//! ```

// Re-export proto error types for convenience.
pub use ping_proto::error::ParseError;

use std::fmt;
use std::io;
use std::net::Ipv4Addr;

use crate::receive::DrainFailure;

/// Conditions this implementation refuses to handle, or that indicate a
/// violated internal invariant.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FatalReason {
    /// A fragmented datagram (MF set or nonzero fragment offset) was received.
    ///
    /// This is reported before the source address is checked, so it can be
    /// triggered by any host.
    Fragmented {
        /// Source address of the fragment.
        source: Ipv4Addr,
    },
    /// The OS accepted fewer bytes than the request packet holds.
    PartialSend {
        /// Number of bytes the OS reported as sent.
        sent: usize,
        /// Size of the request packet.
        expected: usize,
    },
    /// The echo packet could not be extracted after length validation passed.
    ExtractionOutOfBounds {
        /// Declared IPv4 header length.
        header_length: usize,
        /// Number of bytes received.
        available: usize,
    },
    /// A socket error interrupted draining the tail of an oversized datagram.
    DrainInterrupted {
        /// Bytes already discarded when the error occurred.
        discarded: usize,
        /// The kind of the socket error.
        kind: io::ErrorKind,
    },
    /// An oversized datagram's undelivered tail exceeds the discard budget.
    /// The tail was left on the socket, so later reads would start inside it.
    DrainBudgetExceeded {
        /// Source address of the datagram.
        source: Ipv4Addr,
        /// Bytes declared beyond what was read.
        remaining: usize,
        /// The configured discard budget.
        budget: usize,
    },
    /// A reply was matched at a time earlier than its request was sent.
    ClockWentBackwards {
        /// The time passed to `poll`.
        now_ms: u64,
        /// The recorded send time of the matched request.
        last_send_time: u64,
    },
}

/// Why a single datagram was discarded.
#[derive(Debug)]
pub enum BadPacketReason {
    /// The IPv4 header could not be parsed or declares an invalid length.
    MalformedHeader(ParseError),
    /// The datagram is not exactly one IPv4 header plus one echo packet.
    LengthMismatch {
        /// Expected datagram length (`header_length + 12`).
        expected: usize,
        /// Declared total length from the IPv4 header.
        declared: usize,
        /// Bytes actually read into the receive buffer.
        read: usize,
    },
    /// The IPv4 header checksum does not verify.
    HeaderChecksum,
    /// The ICMP checksum does not verify.
    IcmpChecksum,
    /// The tail of an oversized datagram could not be drained completely.
    Drain {
        /// Bytes discarded before the drain stopped.
        discarded: usize,
        /// Why the drain stopped.
        failure: DrainFailure,
    },
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for FatalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalReason::Fragmented { source } => {
                write!(f, "cannot handle fragmented datagram from {source}")
            }
            FatalReason::PartialSend { sent, expected } => {
                write!(f, "partial send: {sent} of {expected} bytes")
            }
            FatalReason::ExtractionOutOfBounds {
                header_length,
                available,
            } => write!(
                f,
                "echo packet at offset {header_length} exceeds {available} received bytes"
            ),
            FatalReason::DrainInterrupted { discarded, kind } => write!(
                f,
                "socket error ({kind}) while draining datagram after {discarded} bytes"
            ),
            FatalReason::DrainBudgetExceeded {
                source,
                remaining,
                budget,
            } => write!(
                f,
                "datagram from {source} has {remaining} undelivered bytes, over the drain budget of {budget}"
            ),
            FatalReason::ClockWentBackwards {
                now_ms,
                last_send_time,
            } => write!(
                f,
                "reply at {now_ms} ms precedes its request sent at {last_send_time} ms"
            ),
        }
    }
}

impl fmt::Display for BadPacketReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BadPacketReason::MalformedHeader(e) => write!(f, "malformed IPv4 header: {e}"),
            BadPacketReason::LengthMismatch {
                expected,
                declared,
                read,
            } => write!(
                f,
                "length mismatch: expected {expected} bytes, declared {declared}, read {read}"
            ),
            BadPacketReason::HeaderChecksum => write!(f, "IPv4 header checksum mismatch"),
            BadPacketReason::IcmpChecksum => write!(f, "ICMP checksum mismatch"),
            BadPacketReason::Drain { discarded, failure } => {
                write!(f, "drain stopped after {discarded} bytes: {failure}")
            }
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for FatalReason {}

impl std::error::Error for BadPacketReason {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BadPacketReason::MalformedHeader(e) => Some(e),
            _ => None,
        }
    }
}

// ── From conversions ────────────────────────────────────────────────

impl From<FatalReason> for io::Error {
    fn from(err: FatalReason) -> io::Error {
        let kind = match &err {
            FatalReason::PartialSend { .. } => io::ErrorKind::WriteZero,
            FatalReason::DrainInterrupted { kind, .. } => *kind,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────
