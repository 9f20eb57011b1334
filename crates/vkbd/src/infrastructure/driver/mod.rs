//! Driver implementations.
//!
//! The uinput driver is Linux-only and selected at compile time.  On other
//! targets [`system_driver`] returns a driver whose `open` always fails, so
//! the rest of the crate (and its tests, which use the mock) still builds.

pub mod mock;

#[cfg(target_os = "linux")]
pub mod uinput;

use crate::application::driver::DeviceDriver;

/// The driver for the current platform.
#[cfg(target_os = "linux")]
pub fn system_driver() -> Box<dyn DeviceDriver> {
    Box::new(uinput::UinputDriver::new())
}

/// The driver for the current platform.
#[cfg(not(target_os = "linux"))]
pub fn system_driver() -> Box<dyn DeviceDriver> {
    Box::new(Unsupported)
}

#[cfg(not(target_os = "linux"))]
struct Unsupported;

#[cfg(not(target_os = "linux"))]
impl DeviceDriver for Unsupported {
    fn open(
        &self,
        _path: &std::path::Path,
    ) -> Result<Box<dyn crate::application::driver::DeviceHandle>, crate::application::driver::DriverError>
    {
        Err(crate::application::driver::DriverError::Platform(
            "uinput is only available on Linux".to_string(),
        ))
    }
}
