//! Domain rules for vkbd.
//!
//! This module contains the pure checks that gate every entry point of a
//! virtual keyboard.  Nothing here opens a device or writes an event; the only
//! interaction with the outside world is the path-existence probe.
//!
//! # Two kinds of failure
//!
//! Creation arguments (device path, device name) are supplied once, by the
//! programmer, and a bad value there is a bug in the calling code.  Key codes
//! arrive continuously at runtime and a bad one is an ordinary, recoverable
//! condition.  The two are therefore reported with two different error types:
//! [`InvalidDeviceConfig`] and [`KeyError`].

pub mod validation;

pub use validation::{
    validate_key_code, validate_name, validate_path, InvalidDeviceConfig, KeyError, MAX_NAME_SIZE,
};
