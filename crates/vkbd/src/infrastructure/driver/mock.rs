//! Recording driver for tests and dry runs.
//!
//! # Why a mock driver?
//!
//! The real [`UinputDriver`](super::uinput::UinputDriver) needs write access
//! to `/dev/uinput`, which CI machines and most developer sessions do not
//! grant, and every event it emits is delivered to the focused window.
//!
//! `MockDriver` performs no I/O.  Each successful driver call is appended to a
//! shared journal, in order, so a test can assert the exact sequence the
//! keyboard produced.  The journal is shared between the driver and every
//! handle it opened, so it stays readable after the handle has been moved
//! into a keyboard.
//!
//! # Usage in tests
//!
//! ```
//! use vkbd::infrastructure::driver::mock::{DriverCall, MockDriver};
//! use vkbd::keys::KEY_A;
//! use vkbd::VirtualKeyboard;
//!
//! let driver = MockDriver::new();
//! let kb = VirtualKeyboard::create(&driver, env!("CARGO_MANIFEST_DIR"), b"kbd")?;
//! driver.clear_journal();
//!
//! kb.key_press(KEY_A)?;
//!
//! // down, sync, up, sync
//! let journal = driver.journal();
//! assert_eq!(journal.len(), 4);
//! assert_eq!(journal[1], DriverCall::Sync);
//! # Ok::<(), vkbd::KeyboardError>(())
//! ```
//!
//! # Failure injection
//!
//! [`MockDriver::failing_on`] makes every call of one kind fail;
//! [`MockDriver::failing_after`] lets the first `n` calls of that kind succeed
//! first.  Failed calls are not journaled.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vkbd_core::protocol::InputEvent;

use crate::application::driver::{DeviceDriver, DeviceHandle, DriverError};

/// One successful driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Open(PathBuf),
    Register { name: Vec<u8>, codes: Vec<u16> },
    Emit(InputEvent),
    Sync,
    Destroy,
}

/// The driver call kinds a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    Open,
    Register,
    Emit,
    Sync,
    Destroy,
}

impl FailurePoint {
    fn matches(self, call: &DriverCall) -> bool {
        matches!(
            (self, call),
            (FailurePoint::Open, DriverCall::Open(_))
                | (FailurePoint::Register, DriverCall::Register { .. })
                | (FailurePoint::Emit, DriverCall::Emit(_))
                | (FailurePoint::Sync, DriverCall::Sync)
                | (FailurePoint::Destroy, DriverCall::Destroy)
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct FailurePlan {
    point: FailurePoint,
    /// Calls of this kind that still succeed before failures start.
    remaining: usize,
}

#[derive(Debug, Default)]
struct Shared {
    journal: Vec<DriverCall>,
    plan: Option<FailurePlan>,
}

impl Shared {
    /// Journals `call`, or fails it if the plan says so.
    fn record(&mut self, call: DriverCall) -> Result<(), DriverError> {
        if let Some(plan) = self.plan.as_mut() {
            if plan.point.matches(&call) {
                if plan.remaining == 0 {
                    return Err(DriverError::Platform(format!(
                        "mock failure on {:?}",
                        plan.point
                    )));
                }
                plan.remaining -= 1;
            }
        }
        self.journal.push(call);
        Ok(())
    }
}

/// A driver that journals every call instead of touching the OS.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    shared: Arc<Mutex<Shared>>,
}

impl MockDriver {
    /// A driver on which every call succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver on which every call of kind `point` fails.
    pub fn failing_on(point: FailurePoint) -> Self {
        Self::failing_after(point, 0)
    }

    /// A driver on which the first `successes` calls of kind `point` succeed
    /// and every later one fails.
    pub fn failing_after(point: FailurePoint, successes: usize) -> Self {
        let driver = Self::new();
        driver.lock().plan = Some(FailurePlan {
            point,
            remaining: successes,
        });
        driver
    }

    /// Snapshot of the journal.
    pub fn journal(&self) -> Vec<DriverCall> {
        self.lock().journal.clone()
    }

    /// Empties the journal, e.g. after the creation calls.
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeviceDriver for MockDriver {
    fn open(&self, path: &Path) -> Result<Box<dyn DeviceHandle>, DriverError> {
        self.lock().record(DriverCall::Open(path.to_path_buf()))?;
        Ok(Box::new(MockHandle {
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// Handle returned by [`MockDriver::open`].
#[derive(Debug)]
pub struct MockHandle {
    shared: Arc<Mutex<Shared>>,
}

impl MockHandle {
    fn record(&self, call: DriverCall) -> Result<(), DriverError> {
        self.shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(call)
    }
}

impl DeviceHandle for MockHandle {
    fn register_key_capabilities(
        &mut self,
        name: &[u8],
        codes: &[u16],
    ) -> Result<(), DriverError> {
        self.record(DriverCall::Register {
            name: name.to_vec(),
            codes: codes.to_vec(),
        })
    }

    fn emit(&mut self, event: InputEvent) -> Result<(), DriverError> {
        self.record(DriverCall::Emit(event))
    }

    fn sync_report(&mut self) -> Result<(), DriverError> {
        self.record(DriverCall::Sync)
    }

    fn sysname(&mut self) -> Result<String, DriverError> {
        Ok("input-mock".to_string())
    }

    fn destroy(self: Box<Self>) -> Result<(), DriverError> {
        self.record(DriverCall::Destroy)
    }
}
