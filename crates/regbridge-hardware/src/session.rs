//! Scoped open/close around a single transaction.

use crate::clock::Sleeper;
use crate::device::UsbBridgeDevice;
use crate::driver::BridgeDriver;
use regbridge_core::Result;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// Keeps a device open for the duration of one transaction.
///
/// [`Session::begin`] opens the device; [`Session::finish`] closes it and
/// merges the close result with the transaction outcome. A session dropped
/// without `finish` (for example while unwinding) still closes the device.
pub(crate) struct Session<'a, D: BridgeDriver, S: Sleeper> {
    device: &'a mut UsbBridgeDevice<D, S>,
    finished: bool,
}

impl<'a, D: BridgeDriver, S: Sleeper> Session<'a, D, S> {
    /// Open the device. Nothing is closed if opening fails.
    pub(crate) fn begin(device: &'a mut UsbBridgeDevice<D, S>) -> Result<Self> {
        device.open()?;
        Ok(Self {
            device,
            finished: false,
        })
    }

    /// Close the device and return the transaction outcome.
    ///
    /// A close failure is returned only when the transaction succeeded;
    /// otherwise the transaction error wins and the close failure is logged.
    pub(crate) fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        self.finished = true;
        let closed = self.device.close();

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                warn!(
                    "Closing bridge #{} failed after transaction error ({}): {}",
                    self.device.index(),
                    err,
                    close_err
                );
                Err(err)
            }
        }
    }
}

impl<D: BridgeDriver, S: Sleeper> Deref for Session<'_, D, S> {
    type Target = UsbBridgeDevice<D, S>;

    fn deref(&self) -> &Self::Target {
        self.device
    }
}

impl<D: BridgeDriver, S: Sleeper> DerefMut for Session<'_, D, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.device
    }
}

impl<D: BridgeDriver, S: Sleeper> Drop for Session<'_, D, S> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(e) = self.device.close() {
            warn!("Closing bridge #{} on drop failed: {}", self.device.index(), e);
        }
    }
}
