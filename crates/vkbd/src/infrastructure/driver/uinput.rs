//! Linux uinput driver.
//!
//! Creates a keyboard by writing to `/dev/uinput` (or whatever path the
//! caller passes) and issuing the uinput ioctls.
//!
//! # What is uinput? (for beginners)
//!
//! `uinput` is a kernel module that turns a file descriptor into an input
//! device.  The sequence is:
//!
//! 1. `open("/dev/uinput", O_WRONLY | O_NONBLOCK)`
//! 2. `UI_SET_EVBIT(EV_KEY)` and `UI_SET_EVBIT(EV_SYN)` – which event types
//!    the device produces.
//! 3. `UI_SET_KEYBIT(code)` once per key it has.
//! 4. `write(struct uinput_user_dev)` – name and bus/vendor/product ids.
//! 5. `UI_DEV_CREATE` – the device now appears under `/dev/input/event*`.
//! 6. `write(struct input_event)` for every event.
//! 7. `UI_DEV_DESTROY` and `close()` to remove it again.
//!
//! # Permissions
//!
//! Writing to `/dev/uinput` normally requires root or membership of the
//! `input` group (distribution dependent).  Without it, `open` fails with
//! `EACCES` and the error surfaces as [`DriverError::Open`].

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::libc;
use tracing::{debug, trace};
use vkbd_core::protocol::{encode_input_event, encode_user_dev, DeviceId, EventType, InputEvent};

use crate::application::driver::{DeviceDriver, DeviceHandle, DriverError};

// ── ioctl definitions (linux/uinput.h) ────────────────────────────────────────

mod ioctl {
    const UINPUT_IOCTL_BASE: u8 = b'U';

    nix::ioctl_none!(ui_dev_create, UINPUT_IOCTL_BASE, 1);
    nix::ioctl_none!(ui_dev_destroy, UINPUT_IOCTL_BASE, 2);
    nix::ioctl_write_int!(ui_set_evbit, UINPUT_IOCTL_BASE, 100);
    nix::ioctl_write_int!(ui_set_keybit, UINPUT_IOCTL_BASE, 101);
    nix::ioctl_read_buf!(ui_get_sysname, UINPUT_IOCTL_BASE, 44, u8);
}

/// Buffer size for `UI_GET_SYSNAME`; kernel names look like `input123`.
const SYSNAME_BUF: usize = 64;

/// Opens uinput devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct UinputDriver {
    id: DeviceId,
}

impl UinputDriver {
    /// A driver announcing devices as a generic USB keyboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver announcing devices with custom bus/vendor/product ids.
    pub fn with_device_id(id: DeviceId) -> Self {
        Self { id }
    }
}

impl DeviceDriver for UinputDriver {
    fn open(&self, path: &Path) -> Result<Box<dyn DeviceHandle>, DriverError> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| DriverError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "opened uinput device file");

        Ok(Box::new(UinputHandle {
            file,
            path: path.to_path_buf(),
            id: self.id,
            created: false,
        }))
    }
}

/// An open `/dev/uinput` file descriptor.
#[derive(Debug)]
pub struct UinputHandle {
    file: File,
    path: PathBuf,
    id: DeviceId,
    /// Set once `UI_DEV_CREATE` succeeded; only then is `UI_DEV_DESTROY` due.
    created: bool,
}

impl UinputHandle {
    fn write_record(&mut self, op: &'static str, bytes: &[u8]) -> Result<(), DriverError> {
        self.file
            .write_all(bytes)
            .map_err(|source| DriverError::Io { op, source })
    }
}

fn errno(op: &'static str) -> impl FnOnce(nix::errno::Errno) -> DriverError {
    move |e| DriverError::Io {
        op,
        source: std::io::Error::from(e),
    }
}

impl DeviceHandle for UinputHandle {
    fn register_key_capabilities(
        &mut self,
        name: &[u8],
        codes: &[u16],
    ) -> Result<(), DriverError> {
        let fd = self.file.as_raw_fd();

        // SAFETY: `fd` is an open uinput descriptor owned by `self.file` for
        // the duration of these calls; the int ioctls take no pointers.
        unsafe {
            ioctl::ui_set_evbit(fd, (EventType::Key as u16).into()).map_err(errno("UI_SET_EVBIT"))?;
            ioctl::ui_set_evbit(fd, (EventType::Syn as u16).into()).map_err(errno("UI_SET_EVBIT"))?;
            for &code in codes {
                ioctl::ui_set_keybit(fd, code.into()).map_err(errno("UI_SET_KEYBIT"))?;
            }
        }

        let record = encode_user_dev(name, self.id)?;
        self.write_record("write uinput_user_dev", &record)?;

        // SAFETY: as above; UI_DEV_CREATE takes no argument.
        unsafe {
            ioctl::ui_dev_create(fd).map_err(errno("UI_DEV_CREATE"))?;
        }
        self.created = true;

        debug!(
            path = %self.path.display(),
            keys = codes.len(),
            "uinput device created"
        );
        Ok(())
    }

    fn emit(&mut self, event: InputEvent) -> Result<(), DriverError> {
        trace!(?event, "write input_event");
        self.write_record("write input_event", &encode_input_event(&event))
    }

    fn sync_report(&mut self) -> Result<(), DriverError> {
        self.emit(InputEvent::sync_report())
    }

    fn sysname(&mut self) -> Result<String, DriverError> {
        let mut buf = [0u8; SYSNAME_BUF];

        // SAFETY: the kernel writes at most `buf.len()` bytes into `buf`.
        unsafe {
            ioctl::ui_get_sysname(self.file.as_raw_fd(), &mut buf)
                .map_err(errno("UI_GET_SYSNAME"))?;
        }

        let len = buf.iter().position(|b| *b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    fn destroy(self: Box<Self>) -> Result<(), DriverError> {
        if self.created {
            // SAFETY: `self.file` is still open; UI_DEV_DESTROY takes no argument.
            unsafe {
                ioctl::ui_dev_destroy(self.file.as_raw_fd()).map_err(errno("UI_DEV_DESTROY"))?;
            }
        }
        debug!(path = %self.path.display(), "uinput device destroyed");
        // `self.file` is closed when the box is dropped.
        Ok(())
    }
}
