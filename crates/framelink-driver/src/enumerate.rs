//! Device and display-mode name enumeration.
//!
//! Thin scan-and-copy helpers for configuration UIs: a missing driver or a
//! bad device index yields an empty list, never an error.

use crate::device::Driver;

/// Names of all available devices, in index order.
pub fn device_names(driver: &dyn Driver) -> Vec<String> {
    driver.enumerate().into_iter().map(|d| d.name).collect()
}

/// Names of the display modes `device` supports. Empty on a wrong index.
pub fn display_mode_names(driver: &dyn Driver, device: usize) -> Vec<String> {
    match driver.display_modes(device) {
        Ok(modes) => modes.into_iter().map(|m| m.name).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    #[test]
    fn test_device_names() {
        let driver = MockDriver::new();
        let names = device_names(&driver);
        assert!(!names.is_empty());
        assert!(names[0].contains("Mock"));
    }

    #[test]
    fn test_bad_device_index_yields_empty_list() {
        let driver = MockDriver::new();
        assert!(display_mode_names(&driver, 99).is_empty());
    }

    #[test]
    fn test_mode_names() {
        let driver = MockDriver::new();
        let names = display_mode_names(&driver, 0);
        assert!(names.iter().any(|n| n == "1080i59.94"));
    }
}
