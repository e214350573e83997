// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The receive half of the socket adapter.
//!
//! The receive buffer holds one maximal IPv4 header plus one echo packet
//! ([`RECEIVE_BUFFER_LEN`] bytes). A datagram whose IPv4 total length is
//! larger than what was read has its tail drained in [`DISCARD_CHUNK`]-sized
//! reads before anything else is read, so later reads stay aligned to
//! datagram boundaries. A tail larger than the discard budget is refused
//! before any of it is read.

use std::fmt;
use std::io;
use std::net::Ipv4Addr;

use log::{debug, trace};
use ping_proto::ipv4::MAX_HEADER_LEN;
use ping_proto::{parse_ipv4_header, ConstPackedSizeBytes, EchoPacket, Ipv4Header, ParseError};

use crate::transport::IcmpTransport;

/// Size of the buffer a datagram is first read into.
pub const RECEIVE_BUFFER_LEN: usize = MAX_HEADER_LEN + EchoPacket::PACKED_SIZE_BYTES;

/// Largest single read used while draining the tail of an oversized datagram.
pub const DISCARD_CHUNK: usize = 64;

/// Result of one non-blocking receive attempt.
#[derive(Debug)]
pub enum Received {
    /// A datagram (or its first `len` bytes) was read.
    Datagram {
        /// Bytes written into the buffer.
        len: usize,
        /// Source address reported by the socket.
        source: Ipv4Addr,
    },
    /// Nothing is queued (`EAGAIN`/`EWOULDBLOCK`).
    Empty,
    /// The socket reported an error other than would-block.
    Error(io::Error),
}

/// Attempt one receive into `buf`, separating "nothing queued" from real errors.
pub fn receive_datagram<T: IcmpTransport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Received {
    match transport.recv_from(buf) {
        Ok((len, source)) => Received::Datagram { len, source },
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Received::Empty,
        Err(e) => Received::Error(e),
    }
}

/// A datagram whose header parsed and whose tail, if any, was fully drained.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Datagram {
    /// The parsed IPv4 header.
    pub header: Ipv4Header,
    /// Source address reported by the socket.
    pub source: Ipv4Addr,
    /// Bytes read into the receive buffer.
    pub read: usize,
    /// Total datagram length declared in the IPv4 header.
    pub total_length: usize,
    /// Bytes drained and thrown away after the first read.
    pub discarded: usize,
}

/// Why draining the tail of an oversized datagram stopped early.
#[derive(Debug)]
pub enum DrainFailure {
    /// A discard read returned fewer bytes than requested.
    ShortRead {
        /// Bytes requested.
        requested: usize,
        /// Bytes returned.
        received: usize,
    },
    /// A discard read came from a different source than the datagram.
    SourceMismatch {
        /// Source of the datagram being drained.
        expected: Ipv4Addr,
        /// Source of the discard read.
        actual: Ipv4Addr,
    },
    /// The socket had nothing more to read.
    WouldBlock,
    /// The socket reported an error.
    Io(io::Error),
}

impl fmt::Display for DrainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainFailure::ShortRead {
                requested,
                received,
            } => write!(f, "short read ({received} of {requested} bytes)"),
            DrainFailure::SourceMismatch { expected, actual } => {
                write!(f, "source changed from {expected} to {actual}")
            }
            DrainFailure::WouldBlock => write!(f, "no more data queued"),
            DrainFailure::Io(e) => write!(f, "{e}"),
        }
    }
}

/// Result of [`receive_truncated`].
#[derive(Debug)]
pub enum Truncated {
    /// The datagram was read and any tail drained.
    Complete(Datagram),
    /// Nothing is queued.
    Empty,
    /// The first read failed.
    Error(io::Error),
    /// The IPv4 header is malformed. Nothing was drained.
    Malformed(ParseError),
    /// The datagram is a fragment. Its source has not been checked.
    Fragmented(Ipv4Header),
    /// The undelivered tail exceeds the discard budget. Nothing was drained,
    /// so the tail is still queued.
    OverBudget {
        /// Source of the datagram.
        source: Ipv4Addr,
        /// Bytes declared beyond what was read.
        remaining: usize,
        /// The discard budget.
        budget: usize,
    },
    /// The tail could not be drained completely.
    DrainFailed {
        /// Source of the datagram.
        source: Ipv4Addr,
        /// Bytes discarded before the drain stopped.
        discarded: usize,
        /// Why the drain stopped.
        failure: DrainFailure,
    },
}

/// Read the first `buf.len()` bytes of the next datagram and drain the rest.
///
/// The IPv4 header is parsed from what was read. Fragments are reported
/// without draining. If the declared total length exceeds the bytes read, the
/// remaining bytes are read and discarded in chunks of at most
/// [`DISCARD_CHUNK`], each of which must come from the same source and be
/// full-length. A tail longer than `discard_budget` is reported as
/// [`Truncated::OverBudget`] without reading any of it.
pub fn receive_truncated<T: IcmpTransport + ?Sized>(
    transport: &mut T,
    buf: &mut [u8],
    discard_budget: usize,
) -> Truncated {
    let (read, source) = match receive_datagram(transport, buf) {
        Received::Datagram { len, source } => (len, source),
        Received::Empty => return Truncated::Empty,
        Received::Error(e) => return Truncated::Error(e),
    };

    let header = match parse_ipv4_header(&buf[..read]) {
        Ok(header) => header,
        Err(e) => return Truncated::Malformed(e),
    };
    if header.is_fragmented() {
        return Truncated::Fragmented(header);
    }

    let total_length = usize::from(header.total_length);
    let mut datagram = Datagram {
        header,
        source,
        read,
        total_length,
        discarded: 0,
    };
    if total_length <= read {
        return Truncated::Complete(datagram);
    }

    let remaining = total_length - read;
    if remaining > discard_budget {
        debug!("datagram from {source} has {remaining} undelivered bytes, over the drain budget");
        return Truncated::OverBudget {
            source,
            remaining,
            budget: discard_budget,
        };
    }

    trace!(
        "datagram from {source} declares {total_length} bytes, read {read}; draining the rest"
    );
    match drain(transport, source, remaining) {
        Ok(discarded) => {
            datagram.discarded = discarded;
            Truncated::Complete(datagram)
        }
        Err((discarded, failure)) => {
            debug!("drain of datagram from {source} stopped after {discarded} bytes: {failure}");
            Truncated::DrainFailed {
                source,
                discarded,
                failure,
            }
        }
    }
}

fn drain<T: IcmpTransport + ?Sized>(
    transport: &mut T,
    source: Ipv4Addr,
    mut remaining: usize,
) -> Result<usize, (usize, DrainFailure)> {
    let mut chunk = [0u8; DISCARD_CHUNK];
    let mut discarded = 0;

    while remaining > 0 {
        let requested = remaining.min(DISCARD_CHUNK);
        match transport.recv_from(&mut chunk[..requested]) {
            Ok((received, from)) => {
                if from != source {
                    return Err((
                        discarded,
                        DrainFailure::SourceMismatch {
                            expected: source,
                            actual: from,
                        },
                    ));
                }
                discarded += received;
                if received < requested {
                    return Err((
                        discarded,
                        DrainFailure::ShortRead {
                            requested,
                            received,
                        },
                    ));
                }
                remaining -= received;
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                return Err((discarded, DrainFailure::WouldBlock));
            }
            Err(e) => return Err((discarded, DrainFailure::Io(e))),
        }
    }
    Ok(discarded)
}
