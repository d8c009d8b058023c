//! Register access through a USB-to-serial bridge.

use crate::clock::{Sleeper, ThreadSleeper};
use crate::config::BridgeConfig;
use crate::driver::{BridgeDriver, DriverOp, StatusExt};
use crate::enumeration;
use crate::session::Session;
use bytes::Bytes;
use regbridge_core::{
    DeviceSelector, Error, ProductField, RawHandle, Result, Transfer,
};
use regbridge_protocol::{RequestFrame, Response, hex_dump};
use tracing::{debug, trace, warn};

/// One bridge chip and the register-addressed peripherals behind it.
///
/// Every register transaction is self-contained: the device is opened, the
/// request is framed and sent, the receive queue is polled until a response
/// is ready, the response is read and its acknowledgement checked, and the
/// device is closed again on every exit path.
///
/// The device is not synchronized. Callers must not run overlapping
/// transactions on the same bridge.
///
/// # Examples
///
/// ```
/// use regbridge_hardware::UsbBridgeDevice;
/// use regbridge_hardware::mock::{MockBridgeDriver, RecordingSleeper};
/// use regbridge_hardware::BridgeConfig;
/// use std::sync::Arc;
///
/// # fn main() -> regbridge_core::Result<()> {
/// let driver = Arc::new(MockBridgeDriver::with_serials(&["NS0001"]));
/// let mut device = UsbBridgeDevice::with_config(
///     Arc::clone(&driver),
///     "ns0001",
///     BridgeConfig::default(),
///     RecordingSleeper::new(),
/// )?;
///
/// device.write_registers(0xC2, 0x82, &[3])?;
/// let channel = device.read_registers(0xC2, 0x82, 1)?;
/// assert_eq!(&channel[..], &[3]);
/// assert!(!device.is_open());
/// # Ok(())
/// # }
/// ```
pub struct UsbBridgeDevice<D: BridgeDriver, S: Sleeper = ThreadSleeper> {
    driver: D,
    sleeper: S,
    config: BridgeConfig,
    index: u32,
    handle: RawHandle,
    is_open: bool,
}

impl<D: BridgeDriver> UsbBridgeDevice<D> {
    /// Select a bridge by index or serial number using the default configuration.
    ///
    /// # Errors
    /// Returns `Error::DeviceNotFound` for an unknown serial number,
    /// `Error::OutOfRange` for an invalid index, and `Error::Driver` if
    /// enumeration fails.
    pub fn new(driver: D, selector: impl Into<DeviceSelector>) -> Result<Self> {
        Self::with_config(driver, selector, BridgeConfig::default(), ThreadSleeper)
    }
}

impl<D: BridgeDriver, S: Sleeper> UsbBridgeDevice<D, S> {
    /// Select a bridge with a custom configuration and sleeper.
    ///
    /// # Errors
    /// Same as [`UsbBridgeDevice::new`], plus `Error::Config` for an invalid
    /// configuration.
    pub fn with_config(
        driver: D,
        selector: impl Into<DeviceSelector>,
        config: BridgeConfig,
        sleeper: S,
    ) -> Result<Self> {
        config.validate()?;
        let index = enumeration::resolve(&driver, &selector.into())?;

        Ok(Self {
            driver,
            sleeper,
            config,
            index,
            handle: RawHandle::default(),
            is_open: false,
        })
    }

    /// Position of this bridge in the driver's enumeration list.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Serial number reported by the driver, trimmed.
    pub fn serial_number(&self) -> Result<String> {
        self.descriptor(ProductField::SerialNumber)
    }

    pub fn description(&self) -> Result<String> {
        self.descriptor(ProductField::Description)
    }

    pub fn link_name(&self) -> Result<String> {
        self.descriptor(ProductField::LinkName)
    }

    pub fn vid(&self) -> Result<String> {
        self.descriptor(ProductField::Vid)
    }

    pub fn pid(&self) -> Result<String> {
        self.descriptor(ProductField::Pid)
    }

    fn descriptor(&self, field: ProductField) -> Result<String> {
        enumeration::product_string(&self.driver, self.index, field).map(|s| s.trim().to_string())
    }

    /// Open the bridge if it is not already open.
    ///
    /// The configured timeouts are applied before the handle is opened. The
    /// handle is only replaced when the open call succeeds.
    pub fn open(&mut self) -> Result<()> {
        if self.is_open {
            return Ok(());
        }

        self.driver
            .set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
            .context(DriverOp::SetTimeouts)?;
        self.handle = self.open_handle()?;
        self.is_open = true;

        debug!("Opened bridge #{} (handle {})", self.index, self.handle);
        Ok(())
    }

    /// Close the bridge if it is open.
    ///
    /// The driver only accepts a close request for a handle it currently
    /// considers open, so an open is attempted first and its failure ignored.
    /// If the close call fails the device stays open, so the next transaction
    /// reuses the handle and the next close retries it.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open {
            return Ok(());
        }

        match self.open_handle() {
            Ok(handle) => self.handle = handle,
            Err(e) => warn!("Re-open of bridge #{} before close ignored: {}", self.index, e),
        }

        self.driver.close(self.handle).context(DriverOp::Close)?;
        self.is_open = false;
        debug!("Closed bridge #{} (handle {})", self.index, self.handle);
        Ok(())
    }

    fn open_handle(&self) -> Result<RawHandle> {
        self.driver.open(self.index).context(DriverOp::Open)
    }

    /// Discard any data pending in the bridge buffers.
    pub fn clear_buffer(&mut self) -> Result<()> {
        self.driver
            .flush_buffers(self.handle)
            .context(DriverOp::FlushBuffers)
    }

    /// Read `length` bytes starting at `register_address` of the peripheral at
    /// `device_address`.
    ///
    /// # Errors
    /// - `Error::Driver` if any driver call fails
    /// - `Error::Io` if fewer bytes were written or read than expected
    /// - `Error::Timeout` if the response never became ready
    /// - `Error::Protocol` if the acknowledgement byte is wrong
    pub fn read_registers(
        &mut self,
        device_address: u8,
        register_address: u8,
        length: u16,
    ) -> Result<Bytes> {
        let frame = RequestFrame::read(device_address, register_address, length);

        let mut session = Session::begin(self)?;
        let outcome = session
            .exchange(&frame)
            .map(|(_, response)| response.into_payload());
        session.finish(outcome)
    }

    /// Write `payload` starting at `register_address` of the peripheral at
    /// `device_address`, returning the byte count reported by the driver.
    ///
    /// # Errors
    /// Same as [`read_registers`](Self::read_registers), plus
    /// `Error::PayloadTooLarge` if the payload cannot be framed. Nothing is
    /// opened in that case.
    pub fn write_registers(
        &mut self,
        device_address: u8,
        register_address: u8,
        payload: &[u8],
    ) -> Result<usize> {
        let frame = RequestFrame::write(device_address, register_address, payload)?;

        let mut session = Session::begin(self)?;
        let outcome = session.exchange(&frame).map(|(written, _)| written);
        session.finish(outcome)
    }

    /// Send one request and receive its acknowledged response.
    fn exchange(&mut self, frame: &RequestFrame) -> Result<(usize, Response)> {
        self.clear_buffer()?;
        let written = self.transmit(frame)?;
        self.wait_rx_ready()?;
        let response = self.receive(frame.expected_response_len())?;
        response.check_ack()?;
        Ok((written, response))
    }

    fn transmit(&mut self, frame: &RequestFrame) -> Result<usize> {
        trace!("TX bridge #{}: {}", self.index, hex_dump(frame.as_bytes()));

        let written = self
            .driver
            .write(self.handle, frame.as_bytes())
            .context(DriverOp::Write)?;
        if written != frame.size() {
            return Err(Error::io(Transfer::Write, frame.size(), written));
        }
        Ok(written)
    }

    fn wait_rx_ready(&mut self) -> Result<()> {
        let attempts = self.config.poll_attempts;
        let interval = self.config.poll_interval();

        for attempt in 1..=attempts {
            let state = self
                .driver
                .check_rx_queue(self.handle)
                .context(DriverOp::CheckRxQueue)?;
            trace!(
                "Poll {}/{} bridge #{}: {:?} with {} bytes queued",
                attempt, attempts, self.index, state.status, state.bytes_in_queue
            );

            if state.status.is_ready() {
                return Ok(());
            }
            self.sleeper.sleep(interval);
        }

        Err(Error::Timeout { attempts })
    }

    fn receive(&mut self, expected: usize) -> Result<Response> {
        let mut buf = vec![0u8; expected];
        let read = self
            .driver
            .read(self.handle, &mut buf)
            .context(DriverOp::Read)?;
        if read != expected {
            return Err(Error::io(Transfer::Read, expected, read));
        }

        trace!("RX bridge #{}: {}", self.index, hex_dump(&buf));
        Response::new(Bytes::from(buf))
    }
}

impl<D: BridgeDriver, S: Sleeper> Drop for UsbBridgeDevice<D, S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Closing bridge #{} on drop failed: {}", self.index, e);
        }
    }
}

impl<D: BridgeDriver, S: Sleeper> std::fmt::Debug for UsbBridgeDevice<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbBridgeDevice")
            .field("index", &self.index)
            .field("handle", &self.handle)
            .field("is_open", &self.is_open)
            .field("config", &self.config)
            .finish()
    }
}
