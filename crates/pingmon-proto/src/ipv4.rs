// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use core::fmt;
use core::net::Ipv4Addr;

use crate::checksum::internet_checksum;
use crate::error::ParseError;
use crate::traits::{ensure_len, ConstPackedSizeBytes, FromBytes, ToBytes};

/// Minimum IPv4 header length in bytes (IHL = 5).
pub const MIN_HEADER_LEN: usize = 20;

/// Maximum size of the IPv4 options field in bytes.
pub const MAX_OPTIONS_LEN: usize = 40;

/// Maximum IPv4 header length in bytes (IHL = 15).
pub const MAX_HEADER_LEN: usize = MIN_HEADER_LEN + MAX_OPTIONS_LEN;

/// IP protocol number for ICMP.
pub const PROTOCOL_ICMP: u8 = 1;

/// "Don't fragment" bit of the 3-bit flags field.
pub const FLAG_DONT_FRAGMENT: u8 = 0b010;

/// "More fragments" bit of the 3-bit flags field.
pub const FLAG_MORE_FRAGMENTS: u8 = 0b001;

/// An IPv4 header as received in front of a raw-socket payload.
///
/// Options are not retained; only their length is reflected in
/// [`header_length`](Self::header_length).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Ipv4Header {
    /// IP version (4 for every header this crate produces).
    pub version: u8,
    /// Header length in bytes (IHL * 4), 20..=60.
    pub header_length: usize,
    /// Type of service / DSCP+ECN byte.
    pub tos: u8,
    /// Total datagram length in bytes, header included.
    pub total_length: u16,
    /// Identification field used for reassembly.
    pub identification: u16,
    /// 3-bit flags field (reserved, DF, MF).
    pub flags: u8,
    /// 13-bit fragment offset in units of 8 bytes.
    pub fragment_offset: u16,
    /// Time to live.
    pub ttl: u8,
    /// Payload protocol number.
    pub protocol: u8,
    /// Header checksum as carried on the wire.
    pub checksum: u16,
    /// Source address.
    pub source: Ipv4Addr,
    /// Destination address.
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Returns `true` if this datagram is a fragment: the "more fragments"
    /// flag is set or the fragment offset is nonzero.
    pub fn is_fragmented(&self) -> bool {
        self.flags & FLAG_MORE_FRAGMENTS != 0 || self.fragment_offset != 0
    }

    /// Compute the checksum this header should carry, treating the checksum
    /// field and any options as zero.
    pub fn compute_checksum(&self) -> u16 {
        let mut scratch = [0u8; MAX_HEADER_LEN];
        let header = Ipv4Header {
            checksum: 0,
            ..*self
        };
        match header.to_bytes(&mut scratch) {
            Ok(written) => internet_checksum(&scratch[..written]),
            Err(_) => internet_checksum(&scratch[..MIN_HEADER_LEN]),
        }
    }
}

impl Default for Ipv4Header {
    fn default() -> Self {
        Ipv4Header {
            version: 4,
            header_length: MIN_HEADER_LEN,
            tos: 0,
            total_length: MIN_HEADER_LEN as u16,
            identification: 0,
            flags: 0,
            fragment_offset: 0,
            ttl: 64,
            protocol: PROTOCOL_ICMP,
            checksum: 0,
            source: Ipv4Addr::UNSPECIFIED,
            destination: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl ConstPackedSizeBytes for Ipv4Header {
    const PACKED_SIZE_BYTES: usize = MIN_HEADER_LEN;
}

/// Parse the IPv4 header at the front of `buf`.
///
/// Fails with [`ParseError::MalformedHeader`] if the IHL field declares fewer
/// than 20 or more than 60 bytes. The upper bound keeps later checksum and
/// payload extraction inside a receive buffer sized for one maximal header.
pub fn parse_ipv4_header(buf: &[u8]) -> Result<Ipv4Header, ParseError> {
    Ipv4Header::from_bytes(buf).map(|(header, _)| header)
}

impl FromBytes for Ipv4Header {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;

        let header_length = usize::from(buf[0] & 0x0F) * 4;
        if !(MIN_HEADER_LEN..=MAX_HEADER_LEN).contains(&header_length) {
            return Err(ParseError::MalformedHeader { header_length });
        }

        let header = Ipv4Header {
            version: buf[0] >> 4,
            header_length,
            tos: buf[1],
            total_length: u16::from_be_bytes([buf[2], buf[3]]),
            identification: u16::from_be_bytes([buf[4], buf[5]]),
            flags: buf[6] >> 5,
            fragment_offset: u16::from_be_bytes([buf[6] & 0x1F, buf[7]]),
            ttl: buf[8],
            protocol: buf[9],
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            source: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            destination: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
        };
        Ok((header, header_length))
    }
}

impl ToBytes for Ipv4Header {
    /// Writes `header_length` bytes; any option bytes are zero.
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        if !(MIN_HEADER_LEN..=MAX_HEADER_LEN).contains(&self.header_length)
            || self.header_length % 4 != 0
        {
            return Err(ParseError::MalformedHeader {
                header_length: self.header_length,
            });
        }
        ensure_len(buf, self.header_length)?;

        buf[0] = (self.version << 4) | (self.header_length / 4) as u8;
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_length.to_be_bytes());
        buf[4..6].copy_from_slice(&self.identification.to_be_bytes());
        let [offset_hi, offset_lo] = self.fragment_offset.to_be_bytes();
        buf[6] = (self.flags << 5) | (offset_hi & 0x1F);
        buf[7] = offset_lo;
        buf[8] = self.ttl;
        buf[9] = self.protocol;
        buf[10..12].copy_from_slice(&self.checksum.to_be_bytes());
        buf[12..16].copy_from_slice(&self.source.octets());
        buf[16..20].copy_from_slice(&self.destination.octets());
        buf[MIN_HEADER_LEN..self.header_length].fill(0);
        Ok(self.header_length)
    }
}

impl fmt::Display for Ipv4Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IPv4 {} -> {} len={} ihl={} id={:#06x} flags={:03b} offset={} ttl={} proto={}",
            self.source,
            self.destination,
            self.total_length,
            self.header_length,
            self.identification,
            self.flags,
            self.fragment_offset,
            self.ttl,
            self.protocol
        )
    }
}
