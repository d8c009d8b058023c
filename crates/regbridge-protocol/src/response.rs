//! Response frames returned by the bridge.
//!
//! The driver only enforces the acknowledgement byte. The trailing checksum
//! can be checked with [`Response::verify_checksum`] when a caller wants the
//! stricter behavior.

use crate::checksum::{checksum, hex_dump};
use bytes::{BufMut, Bytes, BytesMut};
use regbridge_core::{Error, Result, constants::*};
use std::fmt;

/// Response received from the bridge: 8-byte header ending with the ack byte,
/// payload, then one trailing checksum byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    data: Bytes,
}

impl Response {
    /// Wrap raw response bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidResponse` if the bytes are too short to hold the
    /// header and trailer.
    pub fn new(data: Bytes) -> Result<Self> {
        if data.len() < RESPONSE_OVERHEAD {
            return Err(Error::invalid_response(format!(
                "expected at least {} bytes, got {}",
                RESPONSE_OVERHEAD,
                data.len()
            )));
        }
        Ok(Response { data })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::new(Bytes::copy_from_slice(bytes))
    }

    /// Build a well-formed response the way a bridge answers a request.
    ///
    /// The length field counts everything after itself and saturates at
    /// `u16::MAX` for payloads longer than 65530 bytes. Simulated bridges use
    /// this to answer requests; the driver itself never reads the field.
    pub fn encode(
        command: u8,
        device_address: u8,
        register_address: u8,
        ack: u8,
        payload: &[u8],
    ) -> Bytes {
        let length = u16::try_from(payload.len() + RESPONSE_OVERHEAD - REQUEST_PREFIX_LEN)
            .unwrap_or(u16::MAX);

        let mut buf = BytesMut::with_capacity(payload.len() + RESPONSE_OVERHEAD);
        buf.put_slice(&SYNC_PREAMBLE);
        buf.put_u16(length);
        buf.put_u8(command);
        buf.put_u8(device_address);
        buf.put_u8(register_address);
        buf.put_u8(ack);
        buf.put_slice(payload);
        let sum = checksum(&buf);
        buf.put_u8(sum);
        buf.freeze()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Acknowledgement byte at offset 7.
    pub fn ack(&self) -> u8 {
        self.data[ACK_OFFSET]
    }

    /// Fail unless the acknowledgement byte is `0xE0`.
    ///
    /// # Errors
    /// Returns `Error::Protocol` on any other value.
    pub fn check_ack(&self) -> Result<()> {
        if self.ack() != ACK_BYTE {
            return Err(Error::protocol(format!(
                "ack check failed: expected 0x{:02X}, got 0x{:02X}",
                ACK_BYTE,
                self.ack()
            )));
        }
        Ok(())
    }

    /// Payload between the header and the trailing byte.
    pub fn payload(&self) -> &[u8] {
        &self.data[PAYLOAD_OFFSET..self.data.len() - 1]
    }

    /// Consume the response and return its payload without copying.
    pub fn into_payload(self) -> Bytes {
        let end = self.data.len() - 1;
        self.data.slice(PAYLOAD_OFFSET..end)
    }

    /// Trailing checksum/terminator byte.
    pub fn trailer(&self) -> u8 {
        self.data[self.data.len() - 1]
    }

    /// Check the trailing byte against the sum of every preceding byte.
    ///
    /// # Errors
    /// Returns `Error::InvalidResponse` on mismatch.
    pub fn verify_checksum(&self) -> Result<()> {
        let calculated = checksum(&self.data[..self.data.len() - 1]);
        if calculated != self.trailer() {
            return Err(Error::invalid_response(format!(
                "checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
                calculated,
                self.trailer()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Response[size={}, ack=0x{:02X}, bytes='{}']",
            self.size(),
            self.ack(),
            hex_dump(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_write_response() {
        let bytes = Response::encode(CMD_WRITE, 0xC2, 0x82, ACK_BYTE, &[]);
        assert_eq!(bytes.len(), WRITE_RESPONSE_LEN);

        let response = Response::new(bytes).unwrap();
        assert_eq!(response.ack(), ACK_BYTE);
        assert!(response.payload().is_empty());
        response.check_ack().unwrap();
        response.verify_checksum().unwrap();
    }

    #[test]
    fn test_encode_length_field_saturates() {
        let fits = Response::encode(CMD_READ, 0x50, 0x00, ACK_BYTE, &vec![0u8; 65530]);
        assert_eq!(u16::from_be_bytes([fits[2], fits[3]]), u16::MAX);

        let payload = vec![0u8; u16::MAX as usize];
        let bytes = Response::encode(CMD_READ, 0x50, 0x00, ACK_BYTE, &payload);
        assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]), u16::MAX);

        let response = Response::new(bytes).unwrap();
        assert_eq!(response.payload().len(), payload.len());
        response.verify_checksum().unwrap();
    }

    #[test]
    fn test_payload_excludes_header_and_trailer() {
        let response = Response::from_bytes(&[
            0xEF, 0xEF, 0x00, 0x07, 0xF1, 0xC2, 0x82, 0xE0, 0x11, 0x22, 0x33, 0x5A,
        ])
        .unwrap();

        assert_eq!(response.payload(), &[0x11, 0x22, 0x33]);
        assert_eq!(response.trailer(), 0x5A);
        assert_eq!(response.into_payload(), Bytes::from_static(&[0x11, 0x22, 0x33]));
    }

    #[test]
    fn test_ack_mismatch() {
        let bytes = Response::encode(CMD_READ, 0xC2, 0x82, 0xE1, &[0x04]);
        let response = Response::new(bytes).unwrap();

        let err = response.check_ack().unwrap_err();
        assert!(matches!(err, Error::Protocol { .. }));
        assert!(err.to_string().contains("ack check failed"));
    }

    #[test]
    fn test_ack_checked_without_trailer_checksum() {
        // Valid ack with a wrong trailer is still accepted by check_ack.
        let mut raw = Response::encode(CMD_READ, 0xC2, 0x82, ACK_BYTE, &[0x04]).to_vec();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let response = Response::from_bytes(&raw).unwrap();

        response.check_ack().unwrap();
        assert!(matches!(
            response.verify_checksum(),
            Err(Error::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_too_short() {
        let result = Response::from_bytes(&[0xEF, 0xEF, 0x00, 0x04, 0xF0, 0x10, 0x20, 0xE0]);
        assert!(matches!(result, Err(Error::InvalidResponse { .. })));
    }

    #[test]
    fn test_response_display() {
        let response = Response::new(Response::encode(CMD_WRITE, 1, 2, ACK_BYTE, &[])).unwrap();
        let display = format!("{}", response);

        assert!(display.contains("size=9"));
        assert!(display.contains("ack=0xE0"));
    }
}
