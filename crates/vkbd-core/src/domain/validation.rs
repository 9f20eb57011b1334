//! Argument validation for device creation and key events.
//!
//! # Why validate before touching the device? (for beginners)
//!
//! Creating a uinput device allocates a kernel object.  If the name turned out
//! to be too long *after* the device file was opened and its capabilities
//! registered, we would have to unwind half-done kernel state.  Checking every
//! argument up front means an invalid call never reaches the driver at all.
//!
//! The checks run in a fixed order: path emptiness, path existence, then name
//! length.  The first failure wins.

use std::path::Path;

use thiserror::Error;

use crate::keymap::{MAX_KEY, MIN_KEY};

/// Maximum device name length in bytes (`UINPUT_MAX_NAME_SIZE`).
pub const MAX_NAME_SIZE: usize = 80;

/// A creation argument that can never produce a working device.
///
/// The `Display` text of each variant is part of the public contract: callers
/// and tests match on it verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidDeviceConfig {
    #[error("device path must not be empty")]
    EmptyPath,

    #[error("device path '{0}' does not exist")]
    PathNotFound(String),

    #[error("device name {name} is too long (maximum of {max} characters allowed)")]
    NameTooLong { name: String, max: usize },
}

/// A key code outside `[MIN_KEY, MAX_KEY]`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid key code {code} (valid range is {}..={})", MIN_KEY, MAX_KEY)]
pub struct KeyError {
    pub code: i32,
}

/// Checks that `path` is non-empty and names an existing filesystem entry.
///
/// # Errors
///
/// - [`InvalidDeviceConfig::EmptyPath`] for `""`.
/// - [`InvalidDeviceConfig::PathNotFound`] if nothing exists at `path`.
pub fn validate_path(path: &str) -> Result<(), InvalidDeviceConfig> {
    if path.is_empty() {
        return Err(InvalidDeviceConfig::EmptyPath);
    }
    if !Path::new(path).exists() {
        return Err(InvalidDeviceConfig::PathNotFound(path.to_string()));
    }
    Ok(())
}

/// Checks that `name` fits in [`MAX_NAME_SIZE`] bytes.
///
/// The limit is inclusive: an 80-byte name is accepted.
///
/// # Errors
///
/// Returns [`InvalidDeviceConfig::NameTooLong`] otherwise.  Non-UTF-8 bytes
/// are rendered lossily in the message.
pub fn validate_name(name: &[u8]) -> Result<(), InvalidDeviceConfig> {
    if name.len() > MAX_NAME_SIZE {
        return Err(InvalidDeviceConfig::NameTooLong {
            name: String::from_utf8_lossy(name).into_owned(),
            max: MAX_NAME_SIZE,
        });
    }
    Ok(())
}

/// Checks `MIN_KEY <= code <= MAX_KEY`.
///
/// # Errors
///
/// Returns [`KeyError`] carrying the rejected code.
pub fn validate_key_code(code: i32) -> Result<(), KeyError> {
    if (MIN_KEY..=MAX_KEY).contains(&code) {
        Ok(())
    } else {
        Err(KeyError { code })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
