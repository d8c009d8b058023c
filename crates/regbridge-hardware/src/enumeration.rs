//! Enumeration of attached bridges.
//!
//! Free functions over any [`BridgeDriver`]; nothing here keeps state between
//! calls, so every call reflects the devices attached at that moment.

use crate::driver::{BridgeDriver, DriverOp, StatusExt};
use regbridge_core::{DeviceDescriptor, DeviceSelector, Error, ProductField, Result};
use tracing::debug;

/// Number of bridges the driver currently reports.
pub fn count_devices<D: BridgeDriver + ?Sized>(driver: &D) -> Result<u32> {
    driver.device_count().context(DriverOp::DeviceCount)
}

/// One descriptor string of the bridge at `index`, as reported by the driver.
pub fn product_string<D: BridgeDriver + ?Sized>(
    driver: &D,
    index: u32,
    field: ProductField,
) -> Result<String> {
    driver
        .product_string(index, field)
        .context(DriverOp::ProductString)
}

/// All descriptor strings of the bridge at `index`.
pub fn device_descriptor<D: BridgeDriver + ?Sized>(
    driver: &D,
    index: u32,
) -> Result<DeviceDescriptor> {
    Ok(DeviceDescriptor {
        index,
        serial_number: product_string(driver, index, ProductField::SerialNumber)?,
        description: product_string(driver, index, ProductField::Description)?,
        link_name: product_string(driver, index, ProductField::LinkName)?,
        vid: product_string(driver, index, ProductField::Vid)?,
        pid: product_string(driver, index, ProductField::Pid)?,
    })
}

/// Descriptors of every attached bridge, in driver order.
///
/// # Examples
///
/// ```
/// use regbridge_hardware::enumeration::devices_information;
/// use regbridge_hardware::mock::MockBridgeDriver;
///
/// let driver = MockBridgeDriver::with_serials(&["NS0001", "NS0002"]);
/// let devices = devices_information(&driver).unwrap();
///
/// assert_eq!(devices.len(), 2);
/// assert_eq!(devices[1].serial_number, "NS0002");
/// ```
pub fn devices_information<D: BridgeDriver + ?Sized>(driver: &D) -> Result<Vec<DeviceDescriptor>> {
    let count = count_devices(driver)?;
    (0..count)
        .map(|index| device_descriptor(driver, index))
        .collect()
}

/// Index of the bridge whose serial number matches `serial`.
///
/// Matching ignores case and surrounding whitespace on both sides.
///
/// # Errors
/// Returns `Error::DeviceNotFound` if no attached bridge matches.
pub fn find_by_serial<D: BridgeDriver + ?Sized>(driver: &D, serial: &str) -> Result<u32> {
    devices_information(driver)?
        .iter()
        .find(|info| info.matches_serial(serial))
        .map(|info| info.index)
        .ok_or_else(|| Error::DeviceNotFound {
            serial: serial.trim().to_string(),
        })
}

/// Resolve a selector to a device index and check it against the device count.
///
/// # Errors
/// Returns `Error::DeviceNotFound` for an unknown serial number and
/// `Error::OutOfRange` for an index outside `0..count`.
pub fn resolve<D: BridgeDriver + ?Sized>(driver: &D, selector: &DeviceSelector) -> Result<u32> {
    let index = match selector {
        DeviceSelector::Index(index) => *index,
        DeviceSelector::SerialNumber(serial) => find_by_serial(driver, serial)?,
    };

    let count = count_devices(driver)?;
    if index >= count {
        return Err(Error::OutOfRange { index, count });
    }

    debug!("Resolved bridge {} to index {}", selector, index);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBridgeDriver;
    use regbridge_core::constants::SI_DEVICE_IO_FAILED;
    use rstest::rstest;

    #[rstest]
    #[case("NS0002", 1)]
    #[case("ns0002", 1)]
    #[case("  Ns0003 \n", 2)]
    fn test_find_by_serial(#[case] serial: &str, #[case] expected: u32) {
        let driver = MockBridgeDriver::with_serials(&["NS0001", "NS0002", " NS0003 "]);
        assert_eq!(find_by_serial(&driver, serial).unwrap(), expected);
    }

    #[test]
    fn test_find_by_serial_not_found() {
        let driver = MockBridgeDriver::with_serials(&["NS0001"]);
        let err = find_by_serial(&driver, " NS9999 ").unwrap_err();

        assert!(matches!(err, Error::DeviceNotFound { ref serial } if serial == "NS9999"));
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, true)]
    #[case(2, false)]
    #[case(u32::MAX, false)]
    fn test_resolve_index_range(#[case] index: u32, #[case] valid: bool) {
        let driver = MockBridgeDriver::with_serials(&["A", "B"]);
        let result = resolve(&driver, &DeviceSelector::Index(index));

        if valid {
            assert_eq!(result.unwrap(), index);
        } else {
            assert!(matches!(result, Err(Error::OutOfRange { count: 2, .. })));
        }
    }

    #[test]
    fn test_resolve_with_no_devices() {
        let driver = MockBridgeDriver::new();
        assert!(matches!(
            resolve(&driver, &DeviceSelector::Index(0)),
            Err(Error::OutOfRange { index: 0, count: 0 })
        ));
    }

    #[test]
    fn test_enumeration_driver_failure() {
        let driver = MockBridgeDriver::with_serials(&["A"]);
        driver.fail_on(DriverOp::ProductString, SI_DEVICE_IO_FAILED);

        let err = devices_information(&driver).unwrap_err();
        assert!(matches!(
            err,
            Error::Driver { operation: "SI_GetProductString", .. }
        ));
    }

    #[test]
    fn test_descriptor_fields() {
        let driver = MockBridgeDriver::with_serials(&["NS0001"]);
        let info = device_descriptor(&driver, 0).unwrap();

        assert_eq!(info.index, 0);
        assert_eq!(info.serial_number, "NS0001");
        assert_eq!(info.vid, "10C4");
        assert_eq!(info.pid, "EA61");
    }
}
