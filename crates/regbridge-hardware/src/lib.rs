//! Register access for peripherals behind a USB-to-serial bridge.
//!
//! This crate drives a bridge chip that forwards framed register requests to
//! the peripherals wired behind it. All chip access goes through the
//! [`BridgeDriver`] trait, which mirrors the vendor library's flat call
//! surface. A mock implementation is provided for development and testing
//! without hardware.
//!
//! # Register Transactions
//!
//! [`UsbBridgeDevice`] selects one bridge by index or serial number and runs
//! self-contained register transactions on it:
//!
//! ```
//! use regbridge_hardware::UsbBridgeDevice;
//! use regbridge_hardware::mock::MockBridgeDriver;
//!
//! # fn main() -> regbridge_core::Result<()> {
//! let mut device = UsbBridgeDevice::new(MockBridgeDriver::with_serials(&["NS0001"]), 0u32)?;
//!
//! let written = device.write_registers(0x50, 0x10, &[0x01, 0x02])?;
//! assert_eq!(written, 10);
//!
//! let values = device.read_registers(0x50, 0x10, 2)?;
//! assert_eq!(&values[..], &[0x01, 0x02]);
//! # Ok(())
//! # }
//! ```
//!
//! Each transaction opens the bridge, flushes its buffers, sends the request,
//! polls the receive queue until the response is ready, reads and checks the
//! response, and closes the bridge again on every exit path.
//!
//! # Enumeration
//!
//! The [`enumeration`] functions list attached bridges and resolve serial
//! numbers to indices without opening anything.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][regbridge_core::Result] with the shared
//! [`Error`][regbridge_core::Error] type. Driver failures carry the failing
//! call's name and status code.

pub mod clock;
pub mod config;
pub mod device;
pub mod driver;
pub mod enumeration;
pub mod mock;
mod session;

// Re-export commonly used types for convenience
pub use clock::{Sleeper, ThreadSleeper};
pub use config::BridgeConfig;
pub use device::UsbBridgeDevice;
pub use driver::{BridgeDriver, DriverOp, DriverResult};
pub use enumeration::{devices_information, find_by_serial};
