// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Custom error types for buffer-based packet parsing and serialization.
//!
//! [`ParseError`] is `no_std`-compatible and uses no heap allocation. When the
//! `std` feature is enabled, it also implements [`std::error::Error`] and can be
//! converted to [`std::io::Error`].

use core::fmt;

/// Errors that can occur during buffer-based packet parsing or serialization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The buffer is too short for the expected data.
    BufferTooShort {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
    /// The IPv4 header declares a length outside 20..=60 bytes.
    MalformedHeader {
        /// The declared header length in bytes (IHL * 4).
        header_length: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BufferTooShort { needed, available } => {
                write!(
                    f,
                    "buffer too short: needed {} bytes, got {}",
                    needed, available
                )
            }
            ParseError::MalformedHeader { header_length } => {
                write!(f, "malformed IPv4 header length: {} bytes", header_length)
            }
        }
    }
}

#[cfg(feature = "std")]
impl From<ParseError> for std::io::Error {
    fn from(err: ParseError) -> std::io::Error {
        let kind = match &err {
            ParseError::BufferTooShort { .. } => std::io::ErrorKind::UnexpectedEof,
            ParseError::MalformedHeader { .. } => std::io::ErrorKind::InvalidData,
        };
        std::io::Error::new(kind, err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_display_buffer_too_short() {
        let err = ParseError::BufferTooShort {
            needed: 12,
            available: 3,
        };
        assert_eq!(err.to_string(), "buffer too short: needed 12 bytes, got 3");
    }

    #[test]
    fn test_display_malformed_header() {
        let err = ParseError::MalformedHeader { header_length: 16 };
        assert_eq!(err.to_string(), "malformed IPv4 header length: 16 bytes");
    }

    #[test]
    fn test_into_io_error() {
        let io_err: std::io::Error = ParseError::BufferTooShort {
            needed: 20,
            available: 0,
        }
        .into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::UnexpectedEof);

        let io_err: std::io::Error = ParseError::MalformedHeader { header_length: 64 }.into();
        assert_eq!(io_err.kind(), std::io::ErrorKind::InvalidData);
    }
}
