// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use core::fmt;

use crate::checksum::internet_checksum;
use crate::error::ParseError;
use crate::traits::{ensure_len, ConstPackedSizeBytes, FromBytes, ToBytes};

/// ICMP type of an Echo Reply message.
pub const ECHO_REPLY: u8 = 0;

/// ICMP type of an Echo Request message.
pub const ECHO_REQUEST: u8 = 8;

/// Number of payload bytes carried by every echo packet this crate builds.
pub const PAYLOAD_LEN: usize = 4;

/// Filler byte repeated across the echo payload. Not meaningful to the protocol.
pub const PAYLOAD_FILLER: u8 = b'Q';

/// **EchoHeader** - the fixed 8-byte header of an ICMP Echo Request/Reply.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |     Code      |          Checksum             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Identifier          |        Sequence Number        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct EchoHeader {
    /// Message type: [`ECHO_REQUEST`] or [`ECHO_REPLY`].
    pub icmp_type: u8,
    /// Message code, always 0 for echo messages.
    pub code: u8,
    /// Internet checksum over the whole ICMP message.
    pub checksum: u16,
    /// Identifier used to match replies to the requesting session.
    pub identifier: u16,
    /// Sequence number used to match replies to a specific request.
    pub sequence: u16,
}

impl EchoHeader {
    /// Returns `true` if this header is an Echo Reply.
    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == ECHO_REPLY && self.code == 0
    }
}

/// An echo header followed by its fixed-size payload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EchoPacket {
    /// The echo header.
    pub header: EchoHeader,
    /// The echo payload.
    pub payload: [u8; PAYLOAD_LEN],
}

impl EchoPacket {
    /// Create an Echo Request with a zero checksum and filler payload.
    pub fn request(sequence: u16, identifier: u16) -> Self {
        EchoPacket {
            header: EchoHeader {
                icmp_type: ECHO_REQUEST,
                code: 0,
                checksum: 0,
                identifier,
                sequence,
            },
            payload: [PAYLOAD_FILLER; PAYLOAD_LEN],
        }
    }
}

impl ConstPackedSizeBytes for EchoHeader {
    const PACKED_SIZE_BYTES: usize = 8;
}

impl ConstPackedSizeBytes for EchoPacket {
    const PACKED_SIZE_BYTES: usize = EchoHeader::PACKED_SIZE_BYTES + PAYLOAD_LEN;
}

impl FromBytes for EchoHeader {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        let header = EchoHeader {
            icmp_type: buf[0],
            code: buf[1],
            checksum: u16::from_be_bytes([buf[2], buf[3]]),
            identifier: u16::from_be_bytes([buf[4], buf[5]]),
            sequence: u16::from_be_bytes([buf[6], buf[7]]),
        };
        Ok((header, Self::PACKED_SIZE_BYTES))
    }
}

impl FromBytes for EchoPacket {
    fn from_bytes(buf: &[u8]) -> Result<(Self, usize), ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        let (header, offset) = EchoHeader::from_bytes(buf)?;
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&buf[offset..offset + PAYLOAD_LEN]);
        Ok((EchoPacket { header, payload }, Self::PACKED_SIZE_BYTES))
    }
}

impl ToBytes for EchoHeader {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        buf[0] = self.icmp_type;
        buf[1] = self.code;
        buf[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        buf[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl ToBytes for EchoPacket {
    fn to_bytes(&self, buf: &mut [u8]) -> Result<usize, ParseError> {
        ensure_len(buf, Self::PACKED_SIZE_BYTES)?;
        let offset = self.header.to_bytes(buf)?;
        buf[offset..offset + PAYLOAD_LEN].copy_from_slice(&self.payload);
        Ok(Self::PACKED_SIZE_BYTES)
    }
}

impl fmt::Display for EchoPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.header.icmp_type {
            ECHO_REQUEST => "Echo Request",
            ECHO_REPLY => "Echo Reply",
            _ => "ICMP",
        };
        write!(
            f,
            "{} type={} code={} id={} seq={}",
            kind,
            self.header.icmp_type,
            self.header.code,
            self.header.identifier,
            self.header.sequence
        )
    }
}

/// Build a serialized ICMP Echo Request.
///
/// The checksum field is computed over the whole 12-byte packet with the
/// checksum field zeroed, so the result verifies with
/// [`verify_checksum`](crate::checksum::verify_checksum).
pub fn build_echo_request(
    sequence: u16,
    identifier: u16,
) -> [u8; EchoPacket::PACKED_SIZE_BYTES] {
    let mut buf = [0u8; EchoPacket::PACKED_SIZE_BYTES];
    let mut packet = EchoPacket::request(sequence, identifier);
    // The buffer is exactly PACKED_SIZE_BYTES long, so writing cannot fail.
    let _ = packet.to_bytes(&mut buf);
    packet.header.checksum = internet_checksum(&buf);
    buf[2..4].copy_from_slice(&packet.header.checksum.to_be_bytes());
    buf
}

/// Copy the echo packet that follows an IPv4 header of `header_length` bytes.
///
/// Fails with [`ParseError::BufferTooShort`] if `header_length + 12` exceeds
/// the buffer.
pub fn extract_echo_reply(buf: &[u8], header_length: usize) -> Result<EchoPacket, ParseError> {
    let needed = header_length.saturating_add(EchoPacket::PACKED_SIZE_BYTES);
    ensure_len(buf, needed)?;
    EchoPacket::from_bytes(&buf[header_length..needed]).map(|(packet, _)| packet)
}
