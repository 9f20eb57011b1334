//! Application layer: the virtual keyboard and the driver port it runs on.
//!
//! - **`driver`** – The [`DeviceDriver`](driver::DeviceDriver) /
//!   [`DeviceHandle`](driver::DeviceHandle) traits that every backend
//!   implements, and [`DriverError`](driver::DriverError).
//!
//! - **`keyboard`** – [`VirtualKeyboard`](keyboard::VirtualKeyboard): argument
//!   gating, the open/closed state machine, and event framing.

pub mod driver;
pub mod keyboard;
