use crate::checksum::{checksum, hex_dump};
use bytes::{BufMut, Bytes, BytesMut};
use regbridge_core::{Error, Result, constants::*};
use std::fmt;

/// Kind of register transaction a request frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Register write; the response carries no payload.
    Write,
    /// Register read of `length` bytes.
    Read { length: u16 },
}

/// RequestFrame is the byte-level wire format of a request sent to the bridge
///
/// A frame always starts with the `EF EF` preamble, then a big-endian length
/// covering the command byte through the checksum, then the command, device
/// address and register address, an optional payload, and a trailing checksum
/// equal to the low byte of the sum of every preceding byte.
///
/// # Wire Format
///
/// **Register write** (payload of `n` bytes, length field `n + 4`)
/// ```text
/// EF EF 00 05 F0 C2 82 03 1A
///       ^^^^^ ^^ ^^ ^^ ^^ ^^
///       LEN   WR DEV REG DATA SUM
/// ```
///
/// **Register read** (always 10 bytes, length field `6`)
/// ```text
/// EF EF 00 06 F1 C2 82 00 01 1A
///       ^^^^^ ^^ ^^ ^^ ^^^^^ ^^
///       LEN   RD DEV REG COUNT SUM
/// ```
///
/// # Basic Usage
/// ```
/// use regbridge_protocol::RequestFrame;
///
/// let frame = RequestFrame::read(0xC2, 0x82, 1);
/// assert_eq!(
///     frame.as_bytes(),
///     &[0xEF, 0xEF, 0x00, 0x06, 0xF1, 0xC2, 0x82, 0x00, 0x01, 0x1A]
/// );
/// assert_eq!(frame.expected_response_len(), 10);
///
/// let frame = RequestFrame::write(0xC2, 0x82, &[0x03]).unwrap();
/// assert_eq!(frame.size(), 9);
/// assert_eq!(frame.checksum(), 0x1A);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    /// Raw bytes of the frame including preamble and checksum
    data: Bytes,

    /// Transaction carried by the frame
    kind: RequestKind,
}

impl RequestFrame {
    /// Build a register write request.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if the payload length cannot be encoded
    /// in the 16-bit length field.
    pub fn write(device_address: u8, register_address: u8, payload: &[u8]) -> Result<Self> {
        if payload.len() > MAX_WRITE_PAYLOAD {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: MAX_WRITE_PAYLOAD,
            });
        }
        let length = (payload.len() + LENGTH_FIELD_OVERHEAD) as u16;

        let mut buf = BytesMut::with_capacity(payload.len() + WRITE_FRAME_OVERHEAD);
        buf.put_slice(&SYNC_PREAMBLE);
        buf.put_u16(length);
        buf.put_u8(CMD_WRITE);
        buf.put_u8(device_address);
        buf.put_u8(register_address);
        buf.put_slice(payload);
        let sum = checksum(&buf);
        buf.put_u8(sum);

        Ok(RequestFrame {
            data: buf.freeze(),
            kind: RequestKind::Write,
        })
    }

    /// Build a register read request for `length` bytes.
    pub fn read(device_address: u8, register_address: u8, length: u16) -> Self {
        let mut buf = BytesMut::with_capacity(READ_REQUEST_LEN);
        buf.put_slice(&SYNC_PREAMBLE);
        buf.put_u16(READ_REQUEST_LENGTH_FIELD);
        buf.put_u8(CMD_READ);
        buf.put_u8(device_address);
        buf.put_u8(register_address);
        buf.put_u16(length);
        let sum = checksum(&buf);
        buf.put_u8(sum);

        RequestFrame {
            data: buf.freeze(),
            kind: RequestKind::Read { length },
        }
    }

    /// Get the raw bytes of the frame
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its bytes
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Get the frame size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Value of the big-endian length field
    pub fn length_field(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Trailing checksum byte
    pub fn checksum(&self) -> u8 {
        self.data[self.data.len() - 1]
    }

    /// Number of bytes the bridge answers this request with
    pub fn expected_response_len(&self) -> usize {
        match self.kind {
            RequestKind::Write => WRITE_RESPONSE_LEN,
            RequestKind::Read { length } => RESPONSE_OVERHEAD + length as usize,
        }
    }
}

impl fmt::Display for RequestFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RequestFrame[size={}, {:?}, bytes='{}']",
            self.size(),
            self.kind,
            hex_dump(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_write_frame_layout() {
        let frame = RequestFrame::write(0x10, 0x20, &[0xAA, 0xBB]).unwrap();

        assert_eq!(
            frame.as_bytes(),
            &[0xEF, 0xEF, 0x00, 0x06, 0xF0, 0x10, 0x20, 0xAA, 0xBB, 0x69]
        );
        assert_eq!(frame.kind(), RequestKind::Write);
        assert_eq!(frame.length_field(), 6);
    }

    #[test]
    fn test_write_frame_empty_payload() {
        let frame = RequestFrame::write(0x10, 0x20, &[]).unwrap();

        assert_eq!(
            frame.as_bytes(),
            &[0xEF, 0xEF, 0x00, 0x04, 0xF0, 0x10, 0x20, 0x02]
        );
        assert_eq!(frame.expected_response_len(), 9);
    }

    #[test]
    fn test_write_frame_large_payload_uses_high_length_byte() {
        let payload = vec![0u8; 300];
        let frame = RequestFrame::write(0x01, 0x02, &payload).unwrap();

        assert_eq!(frame.length_field(), 304);
        assert_eq!(&frame.as_bytes()[2..4], &[0x01, 0x30]);
        assert_eq!(frame.size(), 308);
    }

    #[test]
    fn test_write_frame_payload_too_large() {
        let payload = vec![0u8; MAX_WRITE_PAYLOAD + 1];
        let result = RequestFrame::write(0x01, 0x02, &payload);

        assert!(matches!(
            result,
            Err(Error::PayloadTooLarge { len, max }) if len == MAX_WRITE_PAYLOAD + 1 && max == MAX_WRITE_PAYLOAD
        ));
    }

    #[test]
    fn test_write_frame_max_payload() {
        let payload = vec![0u8; MAX_WRITE_PAYLOAD];
        let frame = RequestFrame::write(0x01, 0x02, &payload).unwrap();

        assert_eq!(frame.length_field(), u16::MAX);
    }

    #[test]
    fn test_read_frame_layout() {
        let frame = RequestFrame::read(0x50, 0x00, 0x0100);

        assert_eq!(
            frame.as_bytes(),
            &[0xEF, 0xEF, 0x00, 0x06, 0xF1, 0x50, 0x00, 0x01, 0x00, 0x26]
        );
        assert_eq!(frame.kind(), RequestKind::Read { length: 256 });
    }

    #[rstest]
    #[case(0, 9)]
    #[case(1, 10)]
    #[case(16, 25)]
    #[case(u16::MAX, 65544)]
    fn test_read_expected_response_len(#[case] length: u16, #[case] expected: usize) {
        let frame = RequestFrame::read(0xC2, 0x82, length);
        assert_eq!(frame.size(), READ_REQUEST_LEN);
        assert_eq!(frame.expected_response_len(), expected);
    }

    #[test]
    fn test_frame_display() {
        let frame = RequestFrame::read(0xC2, 0x82, 1);
        let display = format!("{}", frame);

        assert!(display.contains("size=10"));
        assert!(display.contains("EF EF 00 06 F1 C2 82 00 01 1A"));
    }
}
