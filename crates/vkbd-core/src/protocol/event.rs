//! Event and device-identity types written to `/dev/uinput`.
//!
//! # What does a key press look like on the wire? (for beginners)
//!
//! The kernel input layer does not deliver single events to listeners.  It
//! collects events into *frames*, and a frame is closed by a synchronization
//! report (`EV_SYN` / `SYN_REPORT`).  Pressing and releasing `A` is therefore
//! four records:
//!
//! ```text
//! EV_KEY  KEY_A  1     key goes down
//! EV_SYN  0      0     frame complete, deliver it
//! EV_KEY  KEY_A  0     key goes up
//! EV_SYN  0      0     frame complete, deliver it
//! ```
//!
//! Leaving out a sync report makes listeners see the down and up transitions
//! in the same frame, which most of them collapse into nothing.

/// `BUS_USB` from `linux/input.h`.
pub const BUS_USB: u16 = 0x03;

/// `SYN_REPORT` event code.
pub const SYN_REPORT: u16 = 0;

/// The event types a keyboard emits.
///
/// Only the two types needed for discrete key transitions are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EventType {
    /// `EV_SYN`: frame delimiter.
    Syn = 0x00,
    /// `EV_KEY`: key press or release.
    Key = 0x01,
}

/// Value of an `EV_KEY` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum KeyValue {
    Released = 0,
    Pressed = 1,
}

/// One `struct input_event`, minus the timestamp.
///
/// The timestamp is always written as zero; the kernel stamps events itself
/// when they pass through uinput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub event_type: EventType,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    /// An `EV_KEY` transition for `code`.
    pub fn key(code: u16, value: KeyValue) -> Self {
        Self {
            event_type: EventType::Key,
            code,
            value: value as i32,
        }
    }

    /// The `EV_SYN` / `SYN_REPORT` frame delimiter.
    pub fn sync_report() -> Self {
        Self {
            event_type: EventType::Syn,
            code: SYN_REPORT,
            value: 0,
        }
    }
}

/// `struct input_id`: how the device identifies itself on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl Default for DeviceId {
    /// A USB keyboard with vendor `0x4711`, product `0x0815`, version 1.
    fn default() -> Self {
        Self {
            bustype: BUS_USB,
            vendor: 0x4711,
            product: 0x0815,
            version: 1,
        }
    }
}
