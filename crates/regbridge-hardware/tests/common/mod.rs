//! Shared helpers for bridge integration tests.

use regbridge_hardware::mock::{MockBridge, MockBridgeDriver, RecordingSleeper};
use regbridge_hardware::{BridgeConfig, UsbBridgeDevice};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Driver with a switch module and an attenuator module attached.
pub fn lab_driver() -> Arc<MockBridgeDriver> {
    let driver = MockBridgeDriver::new();
    driver.add_bridge(MockBridge::new("NS0001").with_description("Optical Switch"));
    driver.add_bridge(
        MockBridge::new("NS0002")
            .with_description("Variable Attenuator")
            .with_register(0x50, 0x00, 0x5A),
    );
    Arc::new(driver)
}

pub fn open_device(
    driver: &Arc<MockBridgeDriver>,
    serial: &str,
) -> (UsbBridgeDevice<Arc<MockBridgeDriver>, RecordingSleeper>, RecordingSleeper) {
    let sleeper = RecordingSleeper::new();
    let device = UsbBridgeDevice::with_config(
        Arc::clone(driver),
        serial,
        BridgeConfig::default(),
        sleeper.clone(),
    )
    .unwrap();
    (device, sleeper)
}
