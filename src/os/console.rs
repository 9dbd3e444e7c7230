//! Console Devices
//!
//! The device behind the three standard handles. Reads and writes on
//! handles 0..=2 go straight to the console, and so does `ioctl`.
//!
//! # Provided Consoles
//! - [`NullConsole`]: discards output, has no input
//! - [`MemoryConsole`]: captures output and replays queued input, for
//!   hosted runs and tests

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use crate::Error;

/// `ioctl` command: number of input bytes ready to read.
pub const IOCTL_INPUT_PENDING: u64 = 0;

/// A character device used for stdin, stdout and stderr.
pub trait Console: Send {
    /// Write all of `data`.
    fn write(&mut self, data: &[u8]) -> Result<(), Error>;

    /// Read whatever input is available, up to `buffer.len()` bytes.
    ///
    /// Returns 0 if nothing is waiting.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Error>;

    /// Device-specific control.
    fn ioctl(&mut self, command: u64, value: u64) -> Result<u64, Error> {
        let _ = (command, value);
        Err(Error::Unimplemented)
    }
}

/// A console that ignores all I/O.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsole;

impl Console for NullConsole {
    fn write(&mut self, _data: &[u8]) -> Result<(), Error> {
        Ok(())
    }

    fn read(&mut self, _buffer: &mut [u8]) -> Result<usize, Error> {
        Ok(0)
    }
}

#[derive(Debug, Default)]
struct Buffers {
    output: Vec<u8>,
    input: VecDeque<u8>,
}

/// A console backed by memory.
///
/// Clones share the same buffers, so one copy can be given to the
/// runtime and another kept to inspect what the application printed.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    buffers: Arc<Mutex<Buffers>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the application to read.
    pub fn push_input(&self, data: &[u8]) {
        self.buffers.lock().input.extend(data.iter().copied());
    }

    /// Take everything written so far.
    pub fn take_output(&self) -> Vec<u8> {
        core::mem::take(&mut self.buffers.lock().output)
    }
}

impl Console for MemoryConsole {
    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.buffers.lock().output.extend_from_slice(data);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
        let mut buffers = self.buffers.lock();
        let count = buffer.len().min(buffers.input.len());
        for (dst, src) in buffer.iter_mut().zip(buffers.input.drain(..count)) {
            *dst = src;
        }
        Ok(count)
    }

    fn ioctl(&mut self, command: u64, _value: u64) -> Result<u64, Error> {
        match command {
            IOCTL_INPUT_PENDING => Ok(self.buffers.lock().input.len() as u64),
            _ => Err(Error::Unimplemented),
        }
    }
}
