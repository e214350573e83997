use ping_proto::icmp::{ECHO_REQUEST, PAYLOAD_FILLER, PAYLOAD_LEN};
use ping_proto::ipv4::{MAX_HEADER_LEN, MIN_HEADER_LEN};
use ping_proto::{
    build_echo_request, extract_echo_reply, internet_checksum, parse_ipv4_header,
    verify_checksum, ConstPackedSizeBytes, EchoPacket, FromBytes,
};
use proptest::prelude::*;

proptest! {
    /// Every built request verifies over its full length.
    #[test]
    fn echo_request_checksum_verifies(sequence in any::<u16>(), identifier in any::<u16>()) {
        let bytes = build_echo_request(sequence, identifier);
        prop_assert!(verify_checksum(&bytes, EchoPacket::PACKED_SIZE_BYTES));
    }

    /// Flipping any single bit of a built request breaks the checksum.
    #[test]
    fn single_bit_flip_breaks_checksum(
        sequence in any::<u16>(),
        identifier in any::<u16>(),
        bit in 0usize..(EchoPacket::PACKED_SIZE_BYTES * 8),
    ) {
        let mut bytes = build_echo_request(sequence, identifier);
        bytes[bit / 8] ^= 1 << (bit % 8);
        prop_assert!(!verify_checksum(&bytes, bytes.len()));
    }

    /// Built requests parse back into the fields they were built from.
    #[test]
    fn echo_request_fields_survive(sequence in any::<u16>(), identifier in any::<u16>()) {
        let bytes = build_echo_request(sequence, identifier);
        let (packet, consumed) = EchoPacket::from_bytes(&bytes).unwrap();
        prop_assert_eq!(consumed, 12);
        prop_assert_eq!(packet.header.icmp_type, ECHO_REQUEST);
        prop_assert_eq!(packet.header.code, 0);
        prop_assert_eq!(packet.header.sequence, sequence);
        prop_assert_eq!(packet.header.identifier, identifier);
        prop_assert_eq!(packet.payload, [PAYLOAD_FILLER; PAYLOAD_LEN]);
    }

    /// Appending the checksum of any even-length payload makes it verify.
    #[test]
    fn checksum_appended_verifies(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let mut data = data;
        if data.len() % 2 == 1 {
            data.push(0);
        }
        let sum = internet_checksum(&data);
        data.extend_from_slice(&sum.to_be_bytes());
        prop_assert!(verify_checksum(&data, data.len()));
    }

    /// Arbitrary bytes either parse as an IPv4 header with a sane length or fail.
    #[test]
    fn ipv4_parse_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..80)) {
        if let Ok(header) = parse_ipv4_header(&bytes) {
            prop_assert!(header.header_length >= MIN_HEADER_LEN);
            prop_assert!(header.header_length <= MAX_HEADER_LEN);
            prop_assert_eq!(header.header_length % 4, 0);
        }
    }

    /// Extraction succeeds exactly when the echo packet fits in the buffer.
    #[test]
    fn extract_respects_bounds(len in 0usize..100, header_length in 0usize..100) {
        let buf = vec![0u8; len];
        let result = extract_echo_reply(&buf, header_length);
        prop_assert_eq!(result.is_ok(), header_length + 12 <= len);
    }
}
