//! Transport: the driver's control channel.
//!
//! Every operation opens one fresh handle, performs its exchange(s), and
//! drops the handle — success or failure. Channel failures carry the raw
//! OS error and are never retried: the driver is synchronous and a blind
//! mount retry is unsafe.

use std::fs::File;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use std::{fmt, io};

use nix::libc;
use std::os::unix::io::AsRawFd;

use crate::error::TransportError;

/// Fixed capacity of every request/response buffer. The size is itself
/// part of the protocol and must match the driver's expectation.
pub const REQUEST_BUFFER_SIZE: usize = 2048;

/// Default time an exchange may block before the handle is abandoned.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// Control channel command codes, a closed and stable enumeration.
const CMD_MOUNT: libc::c_ulong = 9901;
const CMD_UNMOUNT: libc::c_ulong = 9902;
const CMD_GET: libc::c_ulong = 9903;
const CMD_LIST: libc::c_ulong = 9904;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCode {
    Mount,
    Unmount,
    Get,
    List,
}

impl CommandCode {
    pub fn to_raw(self) -> libc::c_ulong {
        match self {
            Self::Mount => CMD_MOUNT,
            Self::Unmount => CMD_UNMOUNT,
            Self::Get => CMD_GET,
            Self::List => CMD_LIST,
        }
    }

    pub fn from_raw(raw: libc::c_ulong) -> Option<Self> {
        match raw {
            CMD_MOUNT => Some(Self::Mount),
            CMD_UNMOUNT => Some(Self::Unmount),
            CMD_GET => Some(Self::Get),
            CMD_LIST => Some(Self::List),
            _ => None,
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mount => "mount",
            Self::Unmount => "unmount",
            Self::Get => "get",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Copies `payload` into a fresh buffer of exactly
/// [`REQUEST_BUFFER_SIZE`] bytes, zero-padding the remainder.
pub fn bufferize(payload: &str) -> Result<Vec<u8>, TransportError> {
    let bytes = payload.as_bytes();
    if bytes.len() >= REQUEST_BUFFER_SIZE {
        return Err(TransportError::PayloadTooLarge {
            length: bytes.len(),
            max: REQUEST_BUFFER_SIZE,
        });
    }
    let mut buffer = vec![0u8; REQUEST_BUFFER_SIZE];
    buffer[..bytes.len()].copy_from_slice(bytes);
    Ok(buffer)
}

/// One open handle to the driver's control channel.
///
/// Issues a single command and returns the driver-populated buffer
/// unmodified, ready for response parsing. Tests substitute a fake
/// implementation; production uses [`DeviceChannel`].
pub trait Transport {
    fn execute(&mut self, code: CommandCode, payload: &str)
        -> Result<Vec<u8>, TransportError>;
}

/// Opens a fresh control-channel handle. The facade calls this once per
/// operation so no handle is ever shared across operations.
pub trait ChannelOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// The production channel: a device node driven by ioctl.
#[derive(Debug, Clone)]
pub struct DeviceChannel {
    path: PathBuf,
    timeout: Duration,
}

impl DeviceChannel {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }
}

impl ChannelOpener for DeviceChannel {
    fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        let file = File::open(&self.path)?;
        Ok(Box::new(DeviceTransport {
            file: Some(file),
            timeout: self.timeout,
        }))
    }
}

/// An open device handle. Dropping it closes the fd on every exit path.
struct DeviceTransport {
    // Taken while an exchange is in flight; stays with the helper thread
    // if the ioctl never returns.
    file: Option<File>,
    timeout: Duration,
}

impl Transport for DeviceTransport {
    fn execute(
        &mut self,
        code: CommandCode,
        payload: &str,
    ) -> Result<Vec<u8>, TransportError> {
        let file = self.file.take().ok_or(TransportError::ChannelClosed)?;
        let mut buffer = bufferize(payload)?;
        let request = code.to_raw();

        // The ioctl is not interruptible, so it runs on a helper thread
        // and we wait with a deadline. On timeout the thread keeps the fd:
        // closing it under a stuck ioctl would be worse than leaking it.
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let rc = unsafe { libc::ioctl(file.as_raw_fd(), request, buffer.as_mut_ptr()) };
            let result = if rc < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(buffer)
            };
            let _ = tx.send((file, result));
        });

        match rx.recv_timeout(self.timeout) {
            Ok((file, result)) => {
                self.file = Some(file);
                result.map_err(TransportError::Io)
            }
            Err(_) => Err(TransportError::Timeout {
                timeout: self.timeout,
            }),
        }
    }
}
