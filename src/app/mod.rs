//! Application Support
//!
//! Safe wrappers an application builds on the [`Api`] it was started with.
//!
//! # Design
//! - [`File`] and [`ReadDir`] own their handle and close it on drop
//! - The console handles from [`stdin`], [`stdout`] and [`stderr`] are
//!   borrowed, never closed
//! - Every method returns `core::result::Result`; nothing here panics
//! - [`ApiAllocator`] lets an application use `alloc` on the table's heap

mod allocator;
pub mod console;

pub use allocator::ApiAllocator;

use alloc::vec::Vec;
use core::fmt;

use crate::dir::{self, Entry};
use crate::file::{self, Flags, Stat};
use crate::{Api, Error};

/// An open file.
#[derive(Debug)]
pub struct File<'a> {
    api: &'a Api,
    handle: file::Handle,
    /// Close the handle on drop?
    owned: bool,
}

impl<'a> File<'a> {
    /// Open a file.
    pub fn open(api: &'a Api, path: &str, flags: Flags) -> Result<Self, Error> {
        let handle = api.open(path, flags)?;
        Ok(Self {
            api,
            handle,
            owned: true,
        })
    }

    /// Create a file, or empty it if it exists, and open it for writing.
    pub fn create(api: &'a Api, path: &str) -> Result<Self, Error> {
        Self::open(api, path, Flags::WRITE | Flags::CREATE | Flags::TRUNCATE)
    }

    fn console(api: &'a Api, handle: file::Handle) -> Self {
        Self {
            api,
            handle,
            owned: false,
        }
    }

    /// The raw handle.
    pub fn handle(&self) -> file::Handle {
        self.handle
    }

    /// Read into `buffer`. A short read is not an error.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
        self.api.read(self.handle, buffer)
    }

    /// Read everything up to the end of the file into `buffer`.
    ///
    /// Returns the number of bytes appended.
    pub fn read_to_end(&mut self, buffer: &mut Vec<u8>) -> Result<usize, Error> {
        let mut chunk = [0u8; 128];
        let mut total = 0;
        loop {
            match self.read(&mut chunk) {
                Ok(0) => return Ok(total),
                Ok(count) => {
                    buffer.extend_from_slice(&chunk[..count]);
                    total += count;
                }
                Err(Error::EndOfFile) => return Ok(total),
                Err(e) => return Err(e),
            }
        }
    }

    /// Write all of `data`.
    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.api.write(self.handle, data)
    }

    /// Seek to an absolute position.
    pub fn seek_set(&mut self, position: u64) -> Result<(), Error> {
        self.api.seek_set(self.handle, position)
    }

    /// Seek relative to the current position. Returns the new position.
    pub fn seek_cur(&mut self, offset: i64) -> Result<u64, Error> {
        self.api.seek_cur(self.handle, offset)
    }

    /// Seek to the end. Returns the new position.
    pub fn seek_end(&mut self) -> Result<u64, Error> {
        self.api.seek_end(self.handle)
    }

    /// Metadata for this file.
    pub fn stat(&self) -> Result<Stat, Error> {
        self.api.fstat(self.handle)
    }

    /// Device-specific control.
    pub fn ioctl(&mut self, command: u64, value: u64) -> Result<u64, Error> {
        self.api.ioctl(self.handle, command, value)
    }

    /// Close the file, reporting any error.
    ///
    /// Dropping a `File` also closes it but the error is lost.
    pub fn close(mut self) -> Result<(), Error> {
        if !self.owned {
            return Ok(());
        }
        self.owned = false;
        self.api.close(self.handle)
    }
}

impl Drop for File<'_> {
    fn drop(&mut self) {
        if self.owned {
            if let Err(e) = self.api.close(self.handle) {
                log::warn!("closing file {} failed: {}", self.handle.value(), e);
            }
        }
    }
}

impl fmt::Write for File<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Standard input.
pub fn stdin(api: &Api) -> File<'_> {
    File::console(api, file::Handle::new_stdin())
}

/// Standard output.
pub fn stdout(api: &Api) -> File<'_> {
    File::console(api, file::Handle::new_stdout())
}

/// Standard error.
pub fn stderr(api: &Api) -> File<'_> {
    File::console(api, file::Handle::new_stderr())
}

/// The entries of a directory, read one at a time.
///
/// The listing can only be walked once.
#[derive(Debug)]
pub struct ReadDir<'a> {
    api: &'a Api,
    handle: dir::Handle,
    done: bool,
}

impl<'a> ReadDir<'a> {
    /// Open a directory for listing.
    pub fn open(api: &'a Api, path: &str) -> Result<Self, Error> {
        let handle = api.opendir(path)?;
        Ok(Self {
            api,
            handle,
            done: false,
        })
    }

    /// The raw handle.
    pub fn handle(&self) -> dir::Handle {
        self.handle
    }
}

impl Iterator for ReadDir<'_> {
    type Item = Result<Entry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.api.readdir(self.handle) {
            Ok(entry) => Some(Ok(entry)),
            Err(Error::EndOfFile) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl Drop for ReadDir<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.api.closedir(self.handle) {
            log::warn!("closing directory {} failed: {}", self.handle.value(), e);
        }
    }
}

/// List a directory.
pub fn read_dir<'a>(api: &'a Api, path: &str) -> Result<ReadDir<'a>, Error> {
    ReadDir::open(api, path)
}

/// The current directory, written into `buffer`.
pub fn current_dir<'b>(api: &Api, buffer: &'b mut [u8]) -> Result<&'b str, Error> {
    let len = api.pwd(buffer)?;
    let bytes = buffer.get(..len).ok_or(Error::InvalidArg)?;
    core::str::from_utf8(bytes).map_err(|_| Error::InvalidArg)
}

/// Change the current directory.
pub fn set_current_dir(api: &Api, path: &str) -> Result<(), Error> {
    api.chdir(path)
}
