//! Vendor bridge driver boundary.
//!
//! The [`BridgeDriver`] trait mirrors the primitive calls exported by the
//! bridge vendor's driver library. Each call either succeeds or reports the
//! driver's non-zero status code; the device layer turns those codes into
//! [`Error::Driver`] tagged with the failing [`DriverOp`].
//!
//! The driver is an explicit dependency: callers create it once and share it
//! between devices through an `Arc`.

use regbridge_core::{Error, ProductField, QueueState, RawHandle, Result, StatusCode};
use std::fmt;
use std::sync::Arc;

/// Result of a raw driver call: the value or the non-zero vendor status.
pub type DriverResult<T> = std::result::Result<T, StatusCode>;

/// Primitive operation of the vendor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverOp {
    DeviceCount,
    ProductString,
    SetTimeouts,
    Open,
    Close,
    FlushBuffers,
    Write,
    CheckRxQueue,
    Read,
}

impl DriverOp {
    /// Name of the vendor entry point, used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeviceCount => "SI_GetNumDevices",
            Self::ProductString => "SI_GetProductString",
            Self::SetTimeouts => "SI_SetTimeouts",
            Self::Open => "SI_Open",
            Self::Close => "SI_Close",
            Self::FlushBuffers => "SI_FlushBuffers",
            Self::Write => "SI_Write",
            Self::CheckRxQueue => "SI_CheckRXQueue",
            Self::Read => "SI_Read",
        }
    }
}

impl fmt::Display for DriverOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Primitive calls of a USB-to-serial bridge driver.
///
/// Implementations are blocking and are not expected to be called from more
/// than one thread at a time for the same handle.
pub trait BridgeDriver {
    /// Number of attached bridges.
    fn device_count(&self) -> DriverResult<u32>;

    /// Descriptor string of the bridge at `index`.
    fn product_string(&self, index: u32, field: ProductField) -> DriverResult<String>;

    /// Read and write timeouts applied to subsequently opened handles.
    fn set_timeouts(&self, read_ms: u32, write_ms: u32) -> DriverResult<()>;

    fn open(&self, index: u32) -> DriverResult<RawHandle>;

    fn close(&self, handle: RawHandle) -> DriverResult<()>;

    /// Discard buffered receive and transmit data.
    fn flush_buffers(&self, handle: RawHandle) -> DriverResult<()>;

    /// Transmit `data`, returning how many bytes were written.
    fn write(&self, handle: RawHandle, data: &[u8]) -> DriverResult<usize>;

    fn check_rx_queue(&self, handle: RawHandle) -> DriverResult<QueueState>;

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read(&self, handle: RawHandle, buf: &mut [u8]) -> DriverResult<usize>;
}

impl<D: BridgeDriver + ?Sized> BridgeDriver for Arc<D> {
    fn device_count(&self) -> DriverResult<u32> {
        (**self).device_count()
    }

    fn product_string(&self, index: u32, field: ProductField) -> DriverResult<String> {
        (**self).product_string(index, field)
    }

    fn set_timeouts(&self, read_ms: u32, write_ms: u32) -> DriverResult<()> {
        (**self).set_timeouts(read_ms, write_ms)
    }

    fn open(&self, index: u32) -> DriverResult<RawHandle> {
        (**self).open(index)
    }

    fn close(&self, handle: RawHandle) -> DriverResult<()> {
        (**self).close(handle)
    }

    fn flush_buffers(&self, handle: RawHandle) -> DriverResult<()> {
        (**self).flush_buffers(handle)
    }

    fn write(&self, handle: RawHandle, data: &[u8]) -> DriverResult<usize> {
        (**self).write(handle, data)
    }

    fn check_rx_queue(&self, handle: RawHandle) -> DriverResult<QueueState> {
        (**self).check_rx_queue(handle)
    }

    fn read(&self, handle: RawHandle, buf: &mut [u8]) -> DriverResult<usize> {
        (**self).read(handle, buf)
    }
}

/// Attach the failing operation to a raw driver status.
pub(crate) trait StatusExt<T> {
    fn context(self, op: DriverOp) -> Result<T>;
}

impl<T> StatusExt<T> for DriverResult<T> {
    fn context(self, op: DriverOp) -> Result<T> {
        self.map_err(|status| Error::driver(op.name(), status))
    }
}
