//! Property-based tests for request framing and response decoding.
//!
//! These tests use proptest to generate random addresses and payloads and
//! verify the framing invariants hold for all of them.

use proptest::prelude::*;
use regbridge_core::constants::*;
use regbridge_protocol::{RequestFrame, Response, checksum};

/// Strategy for payloads short enough for a single-byte-length frame (0-246 bytes).
fn short_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=246)
}

proptest! {
    /// Property: a write frame is the payload plus fixed overhead, its length
    /// field is `payload + 4`, and it ends with the sum of every preceding byte.
    #[test]
    fn prop_write_frame_layout(
        device_address in any::<u8>(),
        register_address in any::<u8>(),
        payload in short_payload(),
    ) {
        let frame = RequestFrame::write(device_address, register_address, &payload).unwrap();
        let bytes = frame.as_bytes();
        let len = payload.len();

        prop_assert_eq!(bytes.len(), len + WRITE_FRAME_OVERHEAD);
        prop_assert_eq!(&bytes[..2], &SYNC_PREAMBLE[..]);
        prop_assert_eq!(frame.length_field() as usize, len + LENGTH_FIELD_OVERHEAD);
        prop_assert_eq!(bytes[4], CMD_WRITE);
        prop_assert_eq!(bytes[5], device_address);
        prop_assert_eq!(bytes[6], register_address);
        prop_assert_eq!(&bytes[7..7 + len], &payload[..]);

        let last = bytes.len() - 1;
        prop_assert_eq!(bytes[last], checksum(&bytes[..last]));
    }

    /// Property: a read request is always 10 bytes whose last byte is the sum
    /// of the first nine.
    #[test]
    fn prop_read_frame_layout(
        device_address in any::<u8>(),
        register_address in any::<u8>(),
        length in any::<u16>(),
    ) {
        let frame = RequestFrame::read(device_address, register_address, length);
        let bytes = frame.as_bytes();

        prop_assert_eq!(bytes.len(), READ_REQUEST_LEN);
        prop_assert_eq!(&bytes[..5], &[0xEF, 0xEF, 0x00, 0x06, CMD_READ][..]);
        prop_assert_eq!(bytes[5], device_address);
        prop_assert_eq!(bytes[6], register_address);
        prop_assert_eq!(u16::from_be_bytes([bytes[7], bytes[8]]), length);

        let wide: u32 = bytes[..9].iter().map(|&b| b as u32).sum();
        prop_assert_eq!(bytes[9] as u32, wide % 256);
    }

    /// Property: the payload of an encoded response is exactly the bytes
    /// between offset 8 and the final byte.
    #[test]
    fn prop_response_payload_extraction(
        device_address in any::<u8>(),
        register_address in any::<u8>(),
        payload in short_payload(),
    ) {
        let bytes = Response::encode(CMD_READ, device_address, register_address, ACK_BYTE, &payload);
        prop_assert_eq!(bytes.len(), payload.len() + RESPONSE_OVERHEAD);

        let response = Response::new(bytes.clone()).unwrap();
        prop_assert!(response.check_ack().is_ok());
        prop_assert!(response.verify_checksum().is_ok());
        prop_assert_eq!(response.payload(), &bytes[8..bytes.len() - 1]);
        prop_assert_eq!(response.payload(), &payload[..]);
    }

    /// Property: any ack byte other than 0xE0 is rejected.
    #[test]
    fn prop_wrong_ack_rejected(
        ack in any::<u8>().prop_filter("ack must differ from 0xE0", |b| *b != ACK_BYTE),
        payload in short_payload(),
    ) {
        let bytes = Response::encode(CMD_READ, 0xC2, 0x82, ack, &payload);
        let response = Response::new(bytes).unwrap();
        prop_assert!(response.check_ack().is_err());
    }
}
