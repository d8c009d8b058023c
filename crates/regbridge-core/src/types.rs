use crate::constants::{RX_EMPTY, RX_OVERRUN, RX_READY};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle returned by the bridge driver when a device is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawHandle(pub u64);

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Receive-queue status reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// Nothing buffered yet.
    Empty,
    /// The receive buffer overflowed.
    Overrun,
    /// A complete response is buffered.
    Ready,
    /// Any other status word.
    Other(u32),
}

impl QueueStatus {
    /// Decode a raw status word.
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            RX_EMPTY => Self::Empty,
            RX_OVERRUN => Self::Overrun,
            RX_READY => Self::Ready,
            other => Self::Other(other),
        }
    }

    /// Raw status word.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::Empty => RX_EMPTY,
            Self::Overrun => RX_OVERRUN,
            Self::Ready => RX_READY,
            Self::Other(code) => *code,
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Result of one receive-queue poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueState {
    /// Bytes currently buffered by the bridge.
    pub bytes_in_queue: u32,

    /// Queue status word.
    pub status: QueueStatus,
}

impl QueueState {
    pub fn new(bytes_in_queue: u32, status: QueueStatus) -> Self {
        Self {
            bytes_in_queue,
            status,
        }
    }
}

/// Descriptor string selector understood by the driver's enumeration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductField {
    SerialNumber,
    Description,
    LinkName,
    Vid,
    Pid,
}

impl ProductField {
    /// All selectors in driver order.
    pub const ALL: [ProductField; 5] = [
        Self::SerialNumber,
        Self::Description,
        Self::LinkName,
        Self::Vid,
        Self::Pid,
    ];

    /// Selector value passed to the driver.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::SerialNumber => 0,
            Self::Description => 1,
            Self::LinkName => 2,
            Self::Vid => 3,
            Self::Pid => 4,
        }
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::SerialNumber => "Serial Number",
            Self::Description => "Description",
            Self::LinkName => "Link Name",
            Self::Vid => "VID",
            Self::Pid => "PID",
        };
        f.write_str(name)
    }
}

/// How a bridge device is chosen among the attached ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceSelector {
    /// Position in the driver's enumeration list.
    Index(u32),
    /// Serial number, matched case-insensitively after trimming.
    SerialNumber(String),
}

impl From<u32> for DeviceSelector {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for DeviceSelector {
    fn from(serial: &str) -> Self {
        Self::SerialNumber(serial.to_string())
    }
}

impl From<String> for DeviceSelector {
    fn from(serial: String) -> Self {
        Self::SerialNumber(serial)
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::SerialNumber(serial) => write!(f, "SN={}", serial.trim()),
        }
    }
}

/// Descriptor strings of one enumerated bridge.
///
/// Strings are kept exactly as the driver reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub index: u32,
    pub serial_number: String,
    pub description: String,
    pub link_name: String,
    pub vid: String,
    pub pid: String,
}

impl DeviceDescriptor {
    /// Whether this descriptor's serial number matches `serial`, ignoring case
    /// and surrounding whitespace on both sides.
    #[must_use]
    pub fn matches_serial(&self, serial: &str) -> bool {
        self.serial_number.trim().to_lowercase() == serial.trim().to_lowercase()
    }
}
