//! Byte encoder for the records written to `/dev/uinput`.
//!
//! Two record types are written:
//!
//! `struct input_event` (one per event):
//! ```text
//! [tv_sec:long][tv_usec:long][type:u16][code:u16][value:i32]
//! ```
//! 24 bytes on 64-bit targets, 16 on 32-bit ones.
//!
//! `struct uinput_user_dev` (once, at device creation):
//! ```text
//! [name:80][bustype:u16][vendor:u16][product:u16][version:u16]
//! [ff_effects_max:u32][absmax:64×i32][absmin:64×i32][absfuzz:64×i32][absflat:64×i32]
//! ```
//! 1116 bytes on every target.
//!
//! The kernel reads these with the host's native layout, so every integer is
//! written in native byte order.

use std::mem::size_of;
use std::os::raw::c_long;

use thiserror::Error;

use crate::domain::MAX_NAME_SIZE;
use crate::protocol::event::{DeviceId, InputEvent};

/// `ABS_CNT`: length of each absolute-axis array in `uinput_user_dev`.
const ABS_CNT: usize = 64;

/// Size of one encoded `input_event`.
pub const INPUT_EVENT_SIZE: usize = 2 * size_of::<c_long>() + 2 + 2 + 4;

/// Size of one encoded `uinput_user_dev`.
pub const USER_DEV_SIZE: usize = MAX_NAME_SIZE + 4 * 2 + 4 + 4 * ABS_CNT * 4;

/// Errors that can occur while encoding a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The device name does not fit the fixed 80-byte field.
    #[error("device name is {len} bytes, the record holds at most {max}")]
    NameTooLong { len: usize, max: usize },
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `event` as a `struct input_event` with a zero timestamp.
///
/// # Examples
///
/// ```rust
/// use vkbd_core::protocol::{encode_input_event, InputEvent, KeyValue, INPUT_EVENT_SIZE};
///
/// let bytes = encode_input_event(&InputEvent::key(30, KeyValue::Pressed));
/// assert_eq!(bytes.len(), INPUT_EVENT_SIZE);
/// ```
pub fn encode_input_event(event: &InputEvent) -> Vec<u8> {
    let mut buf = Vec::with_capacity(INPUT_EVENT_SIZE);

    // struct timeval, left for the kernel to fill in
    buf.extend_from_slice(&(0 as c_long).to_ne_bytes());
    buf.extend_from_slice(&(0 as c_long).to_ne_bytes());

    buf.extend_from_slice(&(event.event_type as u16).to_ne_bytes());
    buf.extend_from_slice(&event.code.to_ne_bytes());
    buf.extend_from_slice(&event.value.to_ne_bytes());
    buf
}

/// Encodes a `struct uinput_user_dev` for a keyboard called `name`.
///
/// Names shorter than the field are NUL-padded.  A keyboard has no absolute
/// axes or force feedback, so those fields are all zero.
///
/// # Errors
///
/// Returns [`ProtocolError::NameTooLong`] if `name` exceeds
/// [`MAX_NAME_SIZE`] bytes.
pub fn encode_user_dev(name: &[u8], id: DeviceId) -> Result<Vec<u8>, ProtocolError> {
    if name.len() > MAX_NAME_SIZE {
        return Err(ProtocolError::NameTooLong {
            len: name.len(),
            max: MAX_NAME_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(USER_DEV_SIZE);

    buf.extend_from_slice(name);
    buf.resize(MAX_NAME_SIZE, 0);

    buf.extend_from_slice(&id.bustype.to_ne_bytes());
    buf.extend_from_slice(&id.vendor.to_ne_bytes());
    buf.extend_from_slice(&id.product.to_ne_bytes());
    buf.extend_from_slice(&id.version.to_ne_bytes());

    buf.extend_from_slice(&0u32.to_ne_bytes()); // ff_effects_max

    // absmax, absmin, absfuzz, absflat
    buf.resize(USER_DEV_SIZE, 0);
    Ok(buf)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
