//! Device Handles
//!
//! File-like access to one device: a position, an open mode, and the
//! reissue loops that turn short I/O into whole transfers.
//!
//! Opening write-only truncates the device. That policy lives here, not
//! in the store.

use std::io::{ErrorKind, SeekFrom};

use crate::error::{Result, ScullError};
use crate::lock::CancelToken;
use crate::manager::Manager;
use crate::store::Store;

/// How a handle was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Open device with its own position and cancellation token
pub struct Handle<'a> {
    store: &'a Store,
    mode: OpenMode,
    position: u64,
    cancel: CancelToken,
}

impl<'a> Handle<'a> {
    /// Open device `index`.
    ///
    /// `WriteOnly` truncates the device first; the other modes leave its
    /// contents alone.
    pub fn open(
        manager: &'a Manager,
        index: usize,
        mode: OpenMode,
        cancel: CancelToken,
    ) -> Result<Self> {
        let store = manager.device(index)?;
        if mode == OpenMode::WriteOnly {
            store.truncate(&cancel)?;
        }

        Ok(Self {
            store,
            mode,
            position: 0,
            cancel,
        })
    }

    /// One read at the current position; may be short. 0 means end of data.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let count = self.store.read(self.position, buf, &self.cancel)?;
        self.position += count as u64;
        Ok(count)
    }

    /// One write at the current position; may be short.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let count = self.store.write(self.position, buf, &self.cancel)?;
        self.position += count as u64;
        Ok(count)
    }

    /// Write all of `buf`, reissuing short writes
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let written = self.write(buf)?;
            if written == 0 {
                return Err(ScullError::Io(std::io::Error::new(
                    ErrorKind::WriteZero,
                    "device accepted no bytes",
                )));
            }
            buf = &buf[written..];
        }
        Ok(())
    }

    /// Read until end of data, appending to `out`. Returns bytes appended.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut chunk = vec![0u8; self.store.quantum()];
        let start = out.len();
        loop {
            let count = self.read(&mut chunk)?;
            if count == 0 {
                return Ok(out.len() - start);
            }
            out.extend_from_slice(&chunk[..count]);
        }
    }

    /// Move the position. `End` is relative to the device size.
    ///
    /// Seeking past the end is allowed; a later write extends the device.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let (base, delta) = match pos {
            SeekFrom::Start(offset) => {
                self.position = offset;
                return Ok(offset);
            }
            SeekFrom::Current(delta) => (self.position, delta),
            SeekFrom::End(delta) => (self.store.size_interruptible(&self.cancel)?, delta),
        };

        let target = base.checked_add_signed(delta).ok_or_else(|| {
            ScullError::InvalidRange(format!("seek from {} by {} is out of range", base, delta))
        })?;
        self.position = target;
        Ok(target)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// Token used for every lock wait made through this handle
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}
