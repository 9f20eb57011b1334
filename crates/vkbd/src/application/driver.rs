//! The driver port: what the virtual keyboard needs from the OS.
//!
//! [`VirtualKeyboard`](super::keyboard::VirtualKeyboard) never talks to
//! `/dev/uinput` directly.  It talks to a [`DeviceDriver`], which hands out a
//! [`DeviceHandle`] per opened device.  The real implementation lives in
//! `infrastructure::driver::uinput`; tests use the recording driver in
//! `infrastructure::driver::mock`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use vkbd_core::protocol::{InputEvent, ProtocolError};

/// Failure reported by a driver.
///
/// These describe the environment (permissions, a missing kernel module, a
/// full pipe), never a mistake in the caller's arguments.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed device record: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("platform error: {0}")]
    Platform(String),
}

/// Opens device resources.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceDriver {
    /// Opens the device file at `path` and returns an exclusively owned handle.
    fn open(&self, path: &Path) -> Result<Box<dyn DeviceHandle>, DriverError>;
}

/// One opened device resource.
///
/// A handle is owned by exactly one keyboard.  [`destroy`](Self::destroy)
/// consumes it, so a released handle cannot be used again.
pub trait DeviceHandle: Send {
    /// Declares the key codes the device can emit and announces it to the
    /// system under `name`.  Called once, right after `open`.
    fn register_key_capabilities(&mut self, name: &[u8], codes: &[u16])
        -> Result<(), DriverError>;

    /// Writes one event.  Listeners do not see it until the next
    /// [`sync_report`](Self::sync_report).
    fn emit(&mut self, event: InputEvent) -> Result<(), DriverError>;

    /// Closes the current event frame.
    fn sync_report(&mut self) -> Result<(), DriverError>;

    /// Kernel name of the created device (e.g. `input42`).
    fn sysname(&mut self) -> Result<String, DriverError>;

    /// Removes the device from the system and releases the resource.
    fn destroy(self: Box<Self>) -> Result<(), DriverError>;
}
