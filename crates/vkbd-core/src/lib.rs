//! # vkbd-core
//!
//! Shared foundation for vkbd: the Linux key-code table, the argument checks
//! that gate a virtual keyboard, and the byte layout of the records written
//! to `/dev/uinput`.
//!
//! This crate performs no device I/O.  The only thing it touches outside its
//! own memory is the filesystem, to check that a device path exists.
//!
//! # Architecture overview (for beginners)
//!
//! Linux lets a user-space program create a keyboard out of thin air through
//! the `uinput` module: open `/dev/uinput`, tell the kernel which keys the
//! keyboard has, give it a name, and from then on every event written to the
//! file shows up to the rest of the system as if a real keyboard produced it.
//!
//! This crate holds the pieces of that story that are pure data and rules:
//!
//! - **`keymap`** – The `KEY_*` code table (`KEY_RESERVED` = 0 through
//!   `KEY_MICMUTE` = 248) and name lookups.
//!
//! - **`domain`** – Validation of the device path, the device name, and key
//!   codes, with the two error severities kept apart.
//!
//! - **`protocol`** – `input_event` and `uinput_user_dev` records and their
//!   encoder.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::{
    validate_key_code, validate_name, validate_path, InvalidDeviceConfig, KeyError, MAX_NAME_SIZE,
};
pub use keymap::{KeyMapper, MAX_KEY, MIN_KEY};
pub use protocol::{encode_input_event, encode_user_dev, EventType, InputEvent, KeyValue};
