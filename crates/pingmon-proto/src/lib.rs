// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! ICMP Echo and IPv4 header codec.
//!
//! This crate provides the wire types and parsing logic needed to ping an IPv4
//! host over a raw socket: Echo Request/Reply messages (RFC 792), the IPv4
//! header that precedes them on receive (RFC 791), and the Internet checksum
//! (RFC 1071). Nothing here allocates or performs I/O.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

/// Internet checksum (RFC 1071) computation and verification.
pub mod checksum;

/// Custom error types for buffer-based packet parsing and serialization.
pub mod error;

/// ICMP Echo Request/Reply types and constants (RFC 792).
pub mod icmp;

/// Read-only view of an IPv4 header (RFC 791).
pub mod ipv4;

mod traits;

pub use self::checksum::{internet_checksum, verify_checksum};
pub use self::error::ParseError;
pub use self::icmp::{build_echo_request, extract_echo_reply, EchoHeader, EchoPacket};
pub use self::ipv4::{parse_ipv4_header, Ipv4Header};
pub use self::traits::*;
