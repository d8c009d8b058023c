use crate::constants::status_name;
use std::fmt;
use thiserror::Error;

/// Direction of a transfer whose byte count did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Write,
    Read,
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// Raw status returned by a bridge driver call, shown in hex with its symbolic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// Get the raw status value.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match status_name(self.0) {
            Some(name) => write!(f, "0x{:02X} ({name})", self.0),
            None => write!(f, "0x{:02X}", self.0),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    // Driver errors
    #[error("Driver call {operation} failed with status {status}")]
    Driver {
        operation: &'static str,
        status: StatusCode,
    },

    // Device selection errors
    #[error("No bridge device with serial number {serial:?}")]
    DeviceNotFound { serial: String },

    #[error("Device index {index} out of range (found {count} devices)")]
    OutOfRange { index: u32, count: u32 },

    // Transaction errors
    #[error("Byte count mismatch on {transfer}: expected {expected}, got {actual}")]
    Io {
        transfer: Transfer,
        expected: usize,
        actual: usize,
    },

    #[error("Receive queue not ready after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // Framing errors
    #[error("Payload of {len} bytes exceeds the {max} byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a driver error for a failed vendor call.
    pub fn driver(operation: &'static str, status: StatusCode) -> Self {
        Self::Driver { operation, status }
    }

    /// Create a byte-count mismatch error.
    pub fn io(transfer: Transfer, expected: usize, actual: usize) -> Self {
        Self::Io {
            transfer,
            expected,
            actual,
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Whether the error is a receive-queue timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether retrying the whole transaction may succeed.
    ///
    /// Timeouts, byte-count mismatches and bad acknowledgements concern a
    /// single exchange. Driver failures and device selection errors do not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Io { .. } | Self::Protocol { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
