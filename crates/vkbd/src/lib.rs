//! vkbd library entry point.
//!
//! Re-exports the public modules so that integration tests in `tests/` and
//! the binary entry point in `main.rs` share the same module tree.
//!
//! # What does vkbd do? (for beginners)
//!
//! vkbd creates a keyboard that exists only in software.  To the rest of the
//! system (X11, Wayland compositors, the Linux console, games reading
//! `/dev/input/event*`) it looks like any USB keyboard that was just plugged
//! in.  Programs then drive it through three calls:
//!
//! 1. [`VirtualKeyboard::key_down`] – the key goes down and stays down.
//! 2. [`VirtualKeyboard::key_up`] – the key is released.
//! 3. [`VirtualKeyboard::key_press`] – down followed immediately by up.
//!
//! [`VirtualKeyboard::close`] removes the device again.
//!
//! # Layers
//!
//! - **`application`** – the [`DeviceDriver`] port and the
//!   [`VirtualKeyboard`] state machine built on it.
//! - **`infrastructure`** – the uinput and mock drivers, and the TOML config
//!   used by the CLI.
//!
//! Argument rules and the key table live in `vkbd_core`.

/// Application layer: the driver port and the keyboard.
pub mod application;

/// Infrastructure layer: OS drivers and configuration.
pub mod infrastructure;

pub use application::driver::{DeviceDriver, DeviceHandle, DriverError};
pub use application::keyboard::{KeyboardError, VirtualKeyboard};
pub use vkbd_core::keymap::linux as keys;

/// Creates a keyboard named `name` on the uinput device at `path` using the
/// driver for the current platform.
///
/// # Panics
///
/// Panics with the validator's message if `path` is empty or missing, or if
/// `name` is longer than [`vkbd_core::MAX_NAME_SIZE`] bytes.  See
/// [`VirtualKeyboard::create`].
///
/// # Errors
///
/// Returns [`KeyboardError::Driver`] if the device could not be opened or
/// registered, typically because the caller lacks write access to `path`.
pub fn create_keyboard(path: &str, name: &[u8]) -> Result<VirtualKeyboard, KeyboardError> {
    let driver = infrastructure::driver::system_driver();
    VirtualKeyboard::create(driver.as_ref(), path, name)
}
