//! Core constants for the bridge register protocol.
//!
//! This module defines the byte-level constants of the register protocol spoken
//! by the USB-to-serial bridge, the default session timings, and the status
//! codes reported by the vendor bridge driver.
//!
//! # Frame Structure
//!
//! Every request sent to the bridge uses the same layout:
//!
//! ```text
//! EF EF LL LL CMD DEV REG [PAYLOAD...] SUM
//! ```
//!
//! Where:
//! - `EF EF` - Sync preamble
//! - `LL LL` - Big-endian length (`CMD` + `DEV` + `REG` + payload + `SUM`)
//! - `CMD` - `0xF0` for a register write, `0xF1` for a register read
//! - `DEV` - Address of the peripheral behind the bridge
//! - `REG` - First register address
//! - `SUM` - Low byte of the sum of all preceding bytes
//!
//! Responses carry an 8-byte header whose last byte is the acknowledgement
//! marker, then the payload, then one trailing checksum byte:
//!
//! ```text
//! EF EF LL LL CMD DEV REG ACK [PAYLOAD...] SUM
//! ```
//!
//! # Usage
//!
//! ```
//! use regbridge_core::constants::*;
//!
//! assert_eq!(SYNC_PREAMBLE, [0xEF, 0xEF]);
//! assert_eq!(READ_REQUEST_LEN, 10);
//! assert_eq!(RESPONSE_OVERHEAD, RESPONSE_HEADER_LEN + 1);
//! ```

// ============================================================================
// Frame Markers
// ============================================================================

/// Two-byte sync preamble that opens every frame.
pub const SYNC_PREAMBLE: [u8; 2] = [SYNC_BYTE, SYNC_BYTE];

/// Value of each sync preamble byte.
pub const SYNC_BYTE: u8 = 0xEF;

/// Command byte for a register write request.
pub const CMD_WRITE: u8 = 0xF0;

/// Command byte for a register read request.
pub const CMD_READ: u8 = 0xF1;

/// Acknowledgement marker expected at [`ACK_OFFSET`] in every response.
pub const ACK_BYTE: u8 = 0xE0;

// ============================================================================
// Frame Geometry
// ============================================================================

/// Bytes counted by the length field besides the payload (`CMD`, `DEV`, `REG`, `SUM`).
pub const LENGTH_FIELD_OVERHEAD: usize = 4;

/// Preamble and length field that precede the length-counted region.
pub const REQUEST_PREFIX_LEN: usize = SYNC_PREAMBLE.len() + 2;

/// Total request overhead around a write payload.
///
/// A write frame carrying `n` payload bytes is `n + WRITE_FRAME_OVERHEAD` bytes long.
pub const WRITE_FRAME_OVERHEAD: usize = REQUEST_PREFIX_LEN + LENGTH_FIELD_OVERHEAD;

/// Largest payload whose length still fits in the 16-bit length field.
pub const MAX_WRITE_PAYLOAD: usize = u16::MAX as usize - LENGTH_FIELD_OVERHEAD;

/// Fixed size of a register read request.
pub const READ_REQUEST_LEN: usize = 10;

/// Value of the length field in a register read request.
pub const READ_REQUEST_LENGTH_FIELD: u16 = 6;

/// Response header size; the header ends with the acknowledgement byte.
pub const RESPONSE_HEADER_LEN: usize = 8;

/// Offset of the acknowledgement byte inside a response.
pub const ACK_OFFSET: usize = RESPONSE_HEADER_LEN - 1;

/// Offset of the first payload byte inside a response.
pub const PAYLOAD_OFFSET: usize = RESPONSE_HEADER_LEN;

/// Header plus trailing checksum byte of every response.
pub const RESPONSE_OVERHEAD: usize = RESPONSE_HEADER_LEN + 1;

/// Size of the response to a register write (no payload).
pub const WRITE_RESPONSE_LEN: usize = RESPONSE_OVERHEAD;

// ============================================================================
// Session Defaults
// ============================================================================

/// Read timeout applied to the driver before each session is opened.
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 500;

/// Write timeout applied to the driver before each session is opened.
pub const DEFAULT_WRITE_TIMEOUT_MS: u32 = 1000;

/// Number of receive-queue polls before a transaction times out.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 100;

/// Delay between two receive-queue polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

// ============================================================================
// Receive Queue Status
// ============================================================================

/// Queue status code: no data buffered.
pub const RX_EMPTY: u32 = 0x00;

/// Queue status code: the receive buffer overflowed.
pub const RX_OVERRUN: u32 = 0x01;

/// Queue status code: a complete response is buffered.
pub const RX_READY: u32 = 0x02;

// ============================================================================
// Driver Status Codes
// ============================================================================

/// Call succeeded.
pub const SI_SUCCESS: u32 = 0x00;
/// Handle is not valid.
pub const SI_INVALID_HANDLE: u32 = 0x01;
/// Read failed.
pub const SI_READ_ERROR: u32 = 0x02;
/// Receive queue is not ready.
pub const SI_RX_QUEUE_NOT_READY: u32 = 0x03;
/// Write failed.
pub const SI_WRITE_ERROR: u32 = 0x04;
/// Reset failed.
pub const SI_RESET_ERROR: u32 = 0x05;
/// A parameter was rejected.
pub const SI_INVALID_PARAMETER: u32 = 0x06;
/// Requested transfer length is invalid.
pub const SI_INVALID_REQUEST_LENGTH: u32 = 0x07;
/// Device I/O failed.
pub const SI_DEVICE_IO_FAILED: u32 = 0x08;
/// Baud rate is not supported.
pub const SI_INVALID_BAUDRATE: u32 = 0x09;
/// Function is not supported by the device.
pub const SI_FUNCTION_NOT_SUPPORTED: u32 = 0x0A;
/// Driver global data is corrupted.
pub const SI_GLOBAL_DATA_ERROR: u32 = 0x0B;
/// Operating system error.
pub const SI_SYSTEM_ERROR_CODE: u32 = 0x0C;
/// Read timed out.
pub const SI_READ_TIMED_OUT: u32 = 0x0D;
/// Write timed out.
pub const SI_WRITE_TIMED_OUT: u32 = 0x0E;
/// Overlapped I/O is still pending.
pub const SI_IO_PENDING: u32 = 0x0F;
/// No pending I/O to cancel.
pub const SI_NOTHING_TO_CANCEL: u32 = 0xA0;
/// No device at the requested index.
pub const SI_DEVICE_NOT_FOUND: u32 = 0xFF;

/// Symbolic name of a driver status code, if it is a known one.
///
/// # Examples
///
/// ```
/// use regbridge_core::constants::{status_name, SI_DEVICE_NOT_FOUND};
///
/// assert_eq!(status_name(SI_DEVICE_NOT_FOUND), Some("SI_DEVICE_NOT_FOUND"));
/// assert_eq!(status_name(0x42), None);
/// ```
pub fn status_name(status: u32) -> Option<&'static str> {
    let name = match status {
        SI_SUCCESS => "SI_SUCCESS",
        SI_INVALID_HANDLE => "SI_INVALID_HANDLE",
        SI_READ_ERROR => "SI_READ_ERROR",
        SI_RX_QUEUE_NOT_READY => "SI_RX_QUEUE_NOT_READY",
        SI_WRITE_ERROR => "SI_WRITE_ERROR",
        SI_RESET_ERROR => "SI_RESET_ERROR",
        SI_INVALID_PARAMETER => "SI_INVALID_PARAMETER",
        SI_INVALID_REQUEST_LENGTH => "SI_INVALID_REQUEST_LENGTH",
        SI_DEVICE_IO_FAILED => "SI_DEVICE_IO_FAILED",
        SI_INVALID_BAUDRATE => "SI_INVALID_BAUDRATE",
        SI_FUNCTION_NOT_SUPPORTED => "SI_FUNCTION_NOT_SUPPORTED",
        SI_GLOBAL_DATA_ERROR => "SI_GLOBAL_DATA_ERROR",
        SI_SYSTEM_ERROR_CODE => "SI_SYSTEM_ERROR_CODE",
        SI_READ_TIMED_OUT => "SI_READ_TIMED_OUT",
        SI_WRITE_TIMED_OUT => "SI_WRITE_TIMED_OUT",
        SI_IO_PENDING => "SI_IO_PENDING",
        SI_NOTHING_TO_CANCEL => "SI_NOTHING_TO_CANCEL",
        SI_DEVICE_NOT_FOUND => "SI_DEVICE_NOT_FOUND",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_geometry() {
        assert_eq!(ACK_OFFSET, 7);
        assert_eq!(PAYLOAD_OFFSET, 8);
        assert_eq!(WRITE_RESPONSE_LEN, 9);
        assert_eq!(WRITE_FRAME_OVERHEAD, 8);
        assert_eq!(MAX_WRITE_PAYLOAD, 65531);
    }

    #[test]
    fn test_read_request_length_field_matches_size() {
        // Length field counts everything after itself.
        assert_eq!(
            READ_REQUEST_LENGTH_FIELD as usize,
            READ_REQUEST_LEN - REQUEST_PREFIX_LEN
        );
    }

    #[test]
    fn test_status_names() {
        assert_eq!(status_name(SI_SUCCESS), Some("SI_SUCCESS"));
        assert_eq!(status_name(SI_READ_TIMED_OUT), Some("SI_READ_TIMED_OUT"));
        assert_eq!(status_name(0x10), None);
    }
}
