//! uinput wire types and the byte encoder for them.

pub mod codec;
pub mod event;

pub use codec::{encode_input_event, encode_user_dev, ProtocolError, INPUT_EVENT_SIZE, USER_DEV_SIZE};
pub use event::{DeviceId, EventType, InputEvent, KeyValue, BUS_USB, SYN_REPORT};
