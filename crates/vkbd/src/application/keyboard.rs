//! VirtualKeyboard: the open/closed device state machine and its event API.
//!
//! The keyboard owns one [`DeviceHandle`] obtained from a [`DeviceDriver`]
//! and exposes `key_down`, `key_up`, `key_press` and `close`.  Every call is
//! gated by the validator in `vkbd_core` before any driver method runs.
//!
//! # Event framing
//!
//! Each transition is written as one `EV_KEY` event followed by its own
//! `SYN_REPORT`, so a press is always observed as two complete frames:
//!
//! ```text
//! key_press(KEY_A)  ->  KEY_A=1, SYN, KEY_A=0, SYN
//! ```
//!
//! # Locking
//!
//! The handle lives behind a `Mutex`.  The lock is held for the whole of one
//! call, including both halves of `key_press`, so `close` cannot land between
//! a down and its up.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};
use vkbd_core::protocol::{InputEvent, KeyValue};
use vkbd_core::{validate_key_code, validate_name, validate_path, KeyError, MAX_KEY, MIN_KEY};

use super::driver::{DeviceDriver, DeviceHandle, DriverError};

/// Directory under which the kernel lists virtual input devices.
pub const SYSFS_INPUT_DIR: &str = "/sys/devices/virtual/input/";

/// Recoverable error returned by the event API.
#[derive(Debug, Error)]
pub enum KeyboardError {
    #[error(transparent)]
    InvalidKeyCode(#[from] KeyError),

    #[error("device is closed")]
    DeviceClosed,

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

type Slot = Option<Box<dyn DeviceHandle>>;

/// A software keyboard registered with the OS.
///
/// Created open; [`close`](Self::close) moves it to the terminal closed
/// state.  Safe to share between threads.
pub struct VirtualKeyboard {
    name: String,
    handle: Mutex<Slot>,
}

impl VirtualKeyboard {
    /// Validates the arguments, opens the device at `path` through `driver`,
    /// and registers every key in `[MIN_KEY, MAX_KEY]` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is empty, if nothing exists at `path`, or if `name`
    /// is longer than [`MAX_NAME_SIZE`](vkbd_core::MAX_NAME_SIZE) bytes.  The
    /// panic message is exactly the validator's message.  These are bugs in
    /// the calling code and no driver call is made.
    ///
    /// # Errors
    ///
    /// Returns [`KeyboardError::Driver`] if the driver fails to open or
    /// register the device.  A handle that was opened is destroyed before the
    /// error is returned.
    pub fn create(
        driver: &dyn DeviceDriver,
        path: &str,
        name: &[u8],
    ) -> Result<Self, KeyboardError> {
        if let Err(err) = validate_path(path).and_then(|()| validate_name(name)) {
            panic!("{err}");
        }

        let mut handle = driver.open(Path::new(path))?;

        let codes: Vec<u16> = (MIN_KEY..=MAX_KEY)
            .filter_map(|code| u16::try_from(code).ok())
            .collect();
        if let Err(err) = handle.register_key_capabilities(name, &codes) {
            if let Err(cleanup) = handle.destroy() {
                warn!("failed to release half-created device at {path}: {cleanup}");
            }
            return Err(err.into());
        }

        let name = String::from_utf8_lossy(name).into_owned();
        info!(%path, %name, keys = codes.len(), "virtual keyboard created");

        Ok(Self {
            name,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// The display name the device was registered with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` until [`close`](Self::close) has been called.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Presses `code` and leaves it down.
    ///
    /// # Errors
    ///
    /// [`KeyboardError::InvalidKeyCode`] for a code outside the legal range,
    /// [`KeyboardError::DeviceClosed`] after `close`, or a wrapped driver
    /// error.  The first two never reach the driver.
    pub fn key_down(&self, code: i32) -> Result<(), KeyboardError> {
        let code = checked_code(code)?;
        let mut slot = self.lock();
        let handle = open_handle(&mut slot)?;
        transition(handle, code, KeyValue::Pressed)
    }

    /// Releases `code`.
    ///
    /// Releasing a key that is not down is allowed; the kernel drops it.
    ///
    /// # Errors
    ///
    /// Same as [`key_down`](Self::key_down).
    pub fn key_up(&self, code: i32) -> Result<(), KeyboardError> {
        let code = checked_code(code)?;
        let mut slot = self.lock();
        let handle = open_handle(&mut slot)?;
        transition(handle, code, KeyValue::Released)
    }

    /// Presses and releases `code`, each transition in its own frame.
    ///
    /// If the press fails the release is not attempted and the press error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Same as [`key_down`](Self::key_down).
    pub fn key_press(&self, code: i32) -> Result<(), KeyboardError> {
        let code = checked_code(code)?;
        let mut slot = self.lock();
        let handle = open_handle(&mut slot)?;
        transition(handle, code, KeyValue::Pressed)?;
        transition(handle, code, KeyValue::Released)
    }

    /// Sysfs directory of the created device, e.g.
    /// `/sys/devices/virtual/input/input42`.
    ///
    /// # Errors
    ///
    /// [`KeyboardError::DeviceClosed`] after `close`, or a wrapped driver
    /// error.
    pub fn syspath(&self) -> Result<String, KeyboardError> {
        let mut slot = self.lock();
        let handle = open_handle(&mut slot)?;
        let sysname = handle.sysname()?;
        Ok(format!("{SYSFS_INPUT_DIR}{sysname}"))
    }

    /// Removes the device from the system.
    ///
    /// The keyboard is closed afterwards even if the driver reports a failure
    /// while destroying the device; that failure is returned.
    ///
    /// # Errors
    ///
    /// Closing an already closed keyboard returns
    /// [`KeyboardError::DeviceClosed`] without calling the driver.
    pub fn close(&self) -> Result<(), KeyboardError> {
        let handle = self.lock().take().ok_or(KeyboardError::DeviceClosed)?;
        handle.destroy()?;
        info!(name = %self.name, "virtual keyboard closed");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for VirtualKeyboard {
    fn drop(&mut self) {
        let slot = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = slot.take() {
            debug!(name = %self.name, "keyboard dropped while open; destroying device");
            if let Err(err) = handle.destroy() {
                warn!(name = %self.name, "failed to destroy device on drop: {err}");
            }
        }
    }
}

impl std::fmt::Debug for VirtualKeyboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualKeyboard")
            .field("name", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}

fn checked_code(code: i32) -> Result<u16, KeyboardError> {
    validate_key_code(code).map_err(|err| {
        debug!(code, "rejected key code");
        err
    })?;
    u16::try_from(code).map_err(|_| KeyError { code }.into())
}

fn open_handle(slot: &mut Slot) -> Result<&mut (dyn DeviceHandle + 'static), KeyboardError> {
    slot.as_deref_mut().ok_or(KeyboardError::DeviceClosed)
}

fn transition(
    handle: &mut dyn DeviceHandle,
    code: u16,
    value: KeyValue,
) -> Result<(), KeyboardError> {
    handle.emit(InputEvent::key(code, value))?;
    handle.sync_report()?;
    debug!(code, ?value, "key transition emitted");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::driver::MockDeviceDriver;
    use crate::infrastructure::driver::mock::{DriverCall, FailurePoint, MockDriver};
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::sync::Arc;
    use std::thread;
    use vkbd_core::keymap::linux::{KEY_1, KEY_A};

    const NAME: &[u8] = b"Test Basic Keyboard";

    /// Any path that exists on the test machine.
    fn existing_path() -> &'static str {
        env!("CARGO_MANIFEST_DIR")
    }

    fn make_keyboard() -> (VirtualKeyboard, MockDriver) {
        let driver = MockDriver::new();
        let kb = VirtualKeyboard::create(&driver, existing_path(), NAME).unwrap();
        driver.clear_journal();
        (kb, driver)
    }

    fn key(code: i32, value: KeyValue) -> DriverCall {
        DriverCall::Emit(InputEvent::key(code as u16, value))
    }

    fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
        payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_default()
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn test_create_opens_and_registers_full_key_range() {
        // Arrange
        let driver = MockDriver::new();

        // Act
        let kb = VirtualKeyboard::create(&driver, existing_path(), NAME).unwrap();

        // Assert
        assert!(kb.is_open());
        assert_eq!(kb.name(), "Test Basic Keyboard");
        assert_eq!(
            driver.journal(),
            vec![
                DriverCall::Open(existing_path().into()),
                DriverCall::Register {
                    name: NAME.to_vec(),
                    codes: (0..=248).collect(),
                },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "device path must not be empty")]
    fn test_create_panics_on_empty_path() {
        let driver = MockDriver::new();
        let _ = VirtualKeyboard::create(&driver, "", b"KeyboardDevice");
    }

    #[test]
    fn test_create_panic_messages_are_exact() {
        let long_name = "adsfdsferqewoirueworiuejdsfjdfa;ljoewrjeworiewuoruew;rj;kdlfjoeai;jfewoaifjef;das";
        let cases: [(&str, &[u8], String); 3] = [
            ("", b"KeyboardDevice", "device path must not be empty".to_string()),
            (
                "/some/bogus/path",
                b"KeyboardDevice",
                "device path '/some/bogus/path' does not exist".to_string(),
            ),
            (
                existing_path(),
                long_name.as_bytes(),
                format!("device name {long_name} is too long (maximum of 80 characters allowed)"),
            ),
        ];

        for (path, name, expected) in cases {
            // Arrange
            let driver = MockDriver::new();

            // Act
            let result = catch_unwind(AssertUnwindSafe(|| {
                VirtualKeyboard::create(&driver, path, name)
            }));

            // Assert
            let payload = result.expect_err("creation must panic");
            assert_eq!(panic_message(payload), expected);
            assert!(driver.journal().is_empty(), "driver must not be touched");
        }
    }

    #[test]
    fn test_invalid_arguments_never_open_the_device() {
        // Arrange – mockall verifies `never()` when the mock is dropped
        let mut driver = MockDeviceDriver::new();
        driver.expect_open().never();

        // Act
        let result = catch_unwind(AssertUnwindSafe(|| {
            VirtualKeyboard::create(&driver, "/some/bogus/path", NAME)
        }));

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_open_failure_is_returned_not_panicked() {
        // Arrange
        let mut driver = MockDeviceDriver::new();
        driver.expect_open().times(1).returning(|path| {
            Err(DriverError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        });

        // Act
        let result = VirtualKeyboard::create(&driver, existing_path(), NAME);

        // Assert
        assert!(matches!(
            result,
            Err(KeyboardError::Driver(DriverError::Open { .. }))
        ));
    }

    #[test]
    fn test_register_failure_destroys_the_opened_handle() {
        // Arrange
        let driver = MockDriver::failing_on(FailurePoint::Register);

        // Act
        let result = VirtualKeyboard::create(&driver, existing_path(), NAME);

        // Assert
        assert!(matches!(result, Err(KeyboardError::Driver(_))));
        assert_eq!(
            driver.journal(),
            vec![DriverCall::Open(existing_path().into()), DriverCall::Destroy]
        );
    }

    // ── Slot access ───────────────────────────────────────────────────────────

    #[test]
    fn test_open_handle_borrows_boxed_handle_from_slot() {
        // Arrange
        let driver = MockDriver::new();
        let mut slot: Slot = Some(driver.open(Path::new(existing_path())).unwrap());
        driver.clear_journal();

        // Act
        let handle = open_handle(&mut slot).unwrap();
        transition(handle, KEY_A as u16, KeyValue::Pressed).unwrap();

        // Assert
        assert_eq!(
            driver.journal(),
            vec![key(KEY_A, KeyValue::Pressed), DriverCall::Sync]
        );
    }

    #[test]
    fn test_open_handle_on_empty_slot_is_device_closed() {
        let mut slot: Slot = None;
        assert!(matches!(
            open_handle(&mut slot),
            Err(KeyboardError::DeviceClosed)
        ));
    }

    // ── Event API ─────────────────────────────────────────────────────────────

    #[test]
    fn test_key_down_emits_press_then_sync() {
        // Arrange
        let (kb, driver) = make_keyboard();

        // Act
        kb.key_down(KEY_A).unwrap();

        // Assert
        assert_eq!(
            driver.journal(),
            vec![key(KEY_A, KeyValue::Pressed), DriverCall::Sync]
        );
    }

    #[test]
    fn test_key_up_emits_release_then_sync() {
        let (kb, driver) = make_keyboard();

        kb.key_up(KEY_A).unwrap();

        assert_eq!(
            driver.journal(),
            vec![key(KEY_A, KeyValue::Released), DriverCall::Sync]
        );
    }

    #[test]
    fn test_key_press_is_two_synchronized_frames() {
        // Arrange
        let (kb, driver) = make_keyboard();

        // Act
        kb.key_press(KEY_1).unwrap();

        // Assert
        assert_eq!(
            driver.journal(),
            vec![
                key(KEY_1, KeyValue::Pressed),
                DriverCall::Sync,
                key(KEY_1, KeyValue::Released),
                DriverCall::Sync,
            ]
        );
    }

    #[test]
    fn test_key_press_equals_down_then_up() {
        // Arrange
        let (pressed, press_driver) = make_keyboard();
        let (split, split_driver) = make_keyboard();

        // Act
        pressed.key_press(KEY_A).unwrap();
        split.key_down(KEY_A).unwrap();
        split.key_up(KEY_A).unwrap();

        // Assert
        assert_eq!(press_driver.journal(), split_driver.journal());
    }

    #[test]
    fn test_bounds_of_key_range_are_accepted() {
        let (kb, _driver) = make_keyboard();

        for code in [MIN_KEY, MAX_KEY] {
            kb.key_press(code).unwrap();
            kb.key_down(code).unwrap();
            kb.key_up(code).unwrap();
        }
    }

    #[test]
    fn test_out_of_range_codes_are_rejected_without_driver_calls() {
        // Arrange
        let (kb, driver) = make_keyboard();

        for code in [-1, 249] {
            // Act
            let results = [kb.key_press(code), kb.key_down(code), kb.key_up(code)];

            // Assert
            for result in results {
                assert!(matches!(
                    result,
                    Err(KeyboardError::InvalidKeyCode(KeyError { code: c })) if c == code
                ));
            }
        }
        assert!(driver.journal().is_empty());
    }

    #[test]
    fn test_failed_down_skips_up() {
        // Arrange
        let driver = MockDriver::failing_on(FailurePoint::Emit);
        let kb = VirtualKeyboard::create(&driver, existing_path(), NAME).unwrap();
        driver.clear_journal();

        // Act
        let result = kb.key_press(KEY_A);

        // Assert
        assert!(matches!(result, Err(KeyboardError::Driver(_))));
        assert!(driver.journal().is_empty(), "no release may follow a failed press");
    }

    #[test]
    fn test_failed_down_sync_skips_up() {
        // Arrange
        let driver = MockDriver::failing_on(FailurePoint::Sync);
        let kb = VirtualKeyboard::create(&driver, existing_path(), NAME).unwrap();
        driver.clear_journal();

        // Act
        let result = kb.key_press(KEY_A);

        // Assert
        assert!(result.is_err());
        assert_eq!(driver.journal(), vec![key(KEY_A, KeyValue::Pressed)]);
    }

    #[test]
    fn test_failed_up_is_reported_after_down_frame() {
        // Arrange – first emit succeeds, second fails
        let driver = MockDriver::failing_after(FailurePoint::Emit, 1);
        let kb = VirtualKeyboard::create(&driver, existing_path(), NAME).unwrap();
        driver.clear_journal();

        // Act
        let result = kb.key_press(KEY_A);

        // Assert
        assert!(matches!(result, Err(KeyboardError::Driver(_))));
        assert_eq!(
            driver.journal(),
            vec![key(KEY_A, KeyValue::Pressed), DriverCall::Sync]
        );
    }

    #[test]
    fn test_syspath_joins_sysfs_dir_and_sysname() {
        let (kb, _driver) = make_keyboard();
        assert_eq!(
            kb.syspath().unwrap(),
            "/sys/devices/virtual/input/input-mock"
        );
    }

    // ── Close ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_close_destroys_device_once() {
        // Arrange
        let (kb, driver) = make_keyboard();

        // Act
        kb.close().unwrap();

        // Assert
        assert!(!kb.is_open());
        assert_eq!(driver.journal(), vec![DriverCall::Destroy]);
    }

    #[test]
    fn test_events_after_close_fail_without_driver_calls() {
        // Arrange
        let (kb, driver) = make_keyboard();
        kb.close().unwrap();
        driver.clear_journal();

        // Act
        let results = [kb.key_press(KEY_1), kb.key_down(KEY_1), kb.key_up(KEY_1)];

        // Assert
        for result in results {
            assert!(matches!(result, Err(KeyboardError::DeviceClosed)));
        }
        assert!(matches!(kb.syspath(), Err(KeyboardError::DeviceClosed)));
        assert!(driver.journal().is_empty());
    }

    #[test]
    fn test_second_close_is_an_error_without_driver_call() {
        // Arrange
        let (kb, driver) = make_keyboard();
        kb.close().unwrap();

        // Act
        let second = kb.close();

        // Assert
        assert!(matches!(second, Err(KeyboardError::DeviceClosed)));
        assert_eq!(driver.journal(), vec![DriverCall::Destroy]);
    }

    #[test]
    fn test_close_failure_still_closes() {
        // Arrange
        let driver = MockDriver::failing_on(FailurePoint::Destroy);
        let kb = VirtualKeyboard::create(&driver, existing_path(), NAME).unwrap();

        // Act
        let result = kb.close();

        // Assert
        assert!(matches!(result, Err(KeyboardError::Driver(_))));
        assert!(!kb.is_open());
        assert!(matches!(kb.key_press(KEY_A), Err(KeyboardError::DeviceClosed)));
    }

    #[test]
    fn test_drop_destroys_open_device() {
        // Arrange
        let (kb, driver) = make_keyboard();

        // Act
        drop(kb);

        // Assert
        assert_eq!(driver.journal(), vec![DriverCall::Destroy]);
    }

    #[test]
    fn test_drop_after_close_does_not_destroy_again() {
        let (kb, driver) = make_keyboard();
        kb.close().unwrap();
        drop(kb);
        assert_eq!(driver.journal(), vec![DriverCall::Destroy]);
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    #[test]
    fn test_concurrent_presses_never_interleave_frames() {
        // Arrange
        let (kb, driver) = make_keyboard();
        let kb = Arc::new(kb);

        // Act
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let kb = Arc::clone(&kb);
                thread::spawn(move || {
                    for _ in 0..50 {
                        kb.key_press(KEY_1 + i).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread panicked");
        }

        // Assert – every press is four consecutive records for one code
        let journal = driver.journal();
        assert_eq!(journal.len(), 4 * 50 * 4);
        for chunk in journal.chunks(4) {
            let DriverCall::Emit(down) = chunk[0].clone() else {
                panic!("press must start with a key event: {chunk:?}");
            };
            assert_eq!(
                chunk,
                &[
                    DriverCall::Emit(down),
                    DriverCall::Sync,
                    DriverCall::Emit(InputEvent::key(down.code, KeyValue::Released)),
                    DriverCall::Sync,
                ]
            );
        }
    }

    #[test]
    fn test_close_waits_for_in_flight_press() {
        // Arrange
        let (kb, driver) = make_keyboard();
        let kb = Arc::new(kb);

        // Act – race presses against close
        let presser = {
            let kb = Arc::clone(&kb);
            thread::spawn(move || {
                while kb.key_press(KEY_A).is_ok() {}
            })
        };
        thread::sleep(std::time::Duration::from_millis(5));
        kb.close().unwrap();
        presser.join().expect("thread panicked");

        // Assert – destroy comes after a complete press, never mid-press
        let journal = driver.journal();
        assert_eq!(journal.last(), Some(&DriverCall::Destroy));
        assert_eq!((journal.len() - 1) % 4, 0, "half-emitted press: {journal:?}");
    }
}
