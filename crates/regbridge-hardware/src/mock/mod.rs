//! Mock driver and sleeper for testing and development.
//!
//! This module provides a simulated bridge driver that can be controlled
//! programmatically without requiring the vendor library or physical hardware.

pub mod driver;
pub mod sleeper;

// Re-export commonly used types
pub use driver::{DriverCall, MockBridge, MockBridgeDriver};
pub use sleeper::RecordingSleeper;
