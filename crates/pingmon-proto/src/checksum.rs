// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

/// Compute the Internet checksum (RFC 1071) of `data`.
///
/// This is the ones'-complement of the ones'-complement sum of the 16-bit
/// big-endian words in `data`. A trailing odd byte is padded with zero.
/// The returned value is ready to be written into a header checksum field in
/// network byte order.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold(ones_complement_sum(data))
}

/// Verify the Internet checksum over exactly the first `length` bytes of `data`.
///
/// A region whose embedded checksum field is correct sums to zero once
/// complemented. Returns `false` if `length` exceeds the buffer.
pub fn verify_checksum(data: &[u8], length: usize) -> bool {
    match data.get(..length) {
        Some(region) => internet_checksum(region) == 0,
        None => false,
    }
}

fn ones_complement_sum(data: &[u8]) -> u32 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
        // Keep the accumulator from overflowing on very long inputs.
        if sum > 0xFFFF_0000 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
    }
    if let Some(&byte) = chunks.remainder().first() {
        sum += u32::from(byte) << 8;
    }
    sum
}

fn fold(mut sum: u32) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc1071_example() {
        // Worked example from RFC 1071 section 3.
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), !0xddf2);
    }

    #[test]
    fn test_known_ipv4_header() {
        // 20-byte header with its checksum field (0xb861) filled in.
        let header = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0x61, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        assert!(verify_checksum(&header, header.len()));

        let mut zeroed = header;
        zeroed[10] = 0;
        zeroed[11] = 0;
        assert_eq!(internet_checksum(&zeroed), 0xb861);
    }

    #[test]
    fn test_odd_length_pads_with_zero() {
        assert_eq!(internet_checksum(&[0x12]), internet_checksum(&[0x12, 0x00]));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
        assert!(!verify_checksum(&[], 0));
    }

    #[test]
    fn test_length_beyond_buffer_is_invalid() {
        let data = [0xFF, 0xFF];
        assert!(verify_checksum(&data, 2));
        assert!(!verify_checksum(&data, 3));
    }

    #[test]
    fn test_verify_only_covers_length() {
        let mut data = [0u8; 6];
        let sum = internet_checksum(&data[..4]);
        data[2..4].copy_from_slice(&sum.to_be_bytes());
        data[4] = 0xAB;
        data[5] = 0xCD;
        assert!(verify_checksum(&data, 4));
        assert!(!verify_checksum(&data, 6));
    }
}
