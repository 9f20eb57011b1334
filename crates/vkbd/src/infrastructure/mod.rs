//! Infrastructure layer: OS-facing adapters.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `vkbd_core`, but MUST NOT be imported by the `application` layer outside
//! of tests.
//!
//! # Sub-modules
//!
//! - **`driver`** – Implementations of `DeviceDriver`: the Linux uinput
//!   driver and the recording `MockDriver`.
//!
//! - **`config`** – TOML configuration for the CLI (device path, name,
//!   timing, log level).

pub mod config;
pub mod driver;
