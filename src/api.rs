//! Operation Table
//!
//! The table of entry points the OS hands to an application at start-up.
//!
//! # Compatibility
//! The application and the OS may be built separately (even by different
//! compilers) and only meet at load time. The field order and every
//! signature below are therefore frozen. New operations may only be
//! appended.
//!
//! # Calling Model
//! Every entry is a direct, synchronous, blocking call. Views passed in are
//! borrowed for that call only. Fallible entries return [`FfiResult`];
//! the typed methods on [`Api`] convert that into a `core::result::Result`.

use core::ffi::c_void;

use crate::ffi::{FfiBuffer, FfiByteSlice, FfiResult, FfiString};
use crate::{dir, file, Error};

/// The operations provided by the OS to an application.
#[repr(C)]
pub struct Api {
    /// Open a file, given a path as a UTF-8 string.
    ///
    /// If the file does not exist, or is already open, it returns an error.
    /// Relative paths are taken relative to the current directory.
    pub open: extern "C" fn(path: FfiString<'_>, flags: file::Flags) -> FfiResult<file::Handle>,
    /// Close a previously opened file.
    ///
    /// Only closing a file guarantees its directory entry is updated on
    /// disk.
    pub close: extern "C" fn(fd: file::Handle) -> FfiResult<()>,
    /// Write to an open file, blocking until everything is written.
    pub write: extern "C" fn(fd: file::Handle, buffer: FfiByteSlice<'_>) -> FfiResult<()>,
    /// Read from an open file, returning how much was actually read.
    ///
    /// Reading while already at the end of the file gives
    /// `Err(Error::EndOfFile)`.
    pub read: extern "C" fn(fd: file::Handle, buffer: FfiBuffer<'_>) -> FfiResult<usize>,
    /// Move the file offset to the given absolute position.
    pub seek_set: extern "C" fn(fd: file::Handle, position: u64) -> FfiResult<()>,
    /// Move the file offset relative to the current position.
    ///
    /// Returns the new file offset.
    pub seek_cur: extern "C" fn(fd: file::Handle, offset: i64) -> FfiResult<u64>,
    /// Move the file offset to the end of the file.
    ///
    /// Returns the new file offset.
    pub seek_end: extern "C" fn(fd: file::Handle) -> FfiResult<u64>,
    /// Rename a file.
    ///
    /// Neither path may be open, and both must be on the same drive.
    pub rename: extern "C" fn(old_path: FfiString<'_>, new_path: FfiString<'_>) -> FfiResult<()>,
    /// Perform a device-specific I/O control operation.
    pub ioctl: extern "C" fn(fd: file::Handle, command: u64, value: u64) -> FfiResult<u64>,
    /// Open a directory, given a path as a UTF-8 string.
    pub opendir: extern "C" fn(path: FfiString<'_>) -> FfiResult<dir::Handle>,
    /// Close a previously opened directory.
    pub closedir: extern "C" fn(dir: dir::Handle) -> FfiResult<()>,
    /// Read the next entry from an open directory.
    ///
    /// Gives `Err(Error::EndOfFile)` once all entries have been read.
    pub readdir: extern "C" fn(dir: dir::Handle) -> FfiResult<dir::Entry>,
    /// Get information about a file.
    pub stat: extern "C" fn(path: FfiString<'_>) -> FfiResult<file::Stat>,
    /// Get information about an open file.
    pub fstat: extern "C" fn(fd: file::Handle) -> FfiResult<file::Stat>,
    /// Delete a file. The file must not be open.
    pub deletefile: extern "C" fn(path: FfiString<'_>) -> FfiResult<()>,
    /// Delete an empty directory. Volume roots cannot be deleted.
    pub deletedir: extern "C" fn(path: FfiString<'_>) -> FfiResult<()>,
    /// Change the current directory.
    ///
    /// There is one current directory for the whole system, not one per
    /// drive.
    pub chdir: extern "C" fn(path: FfiString<'_>) -> FfiResult<()>,
    /// Change the current directory to the given open directory.
    pub dchdir: extern "C" fn(dir: dir::Handle) -> FfiResult<()>,
    /// Write the current directory into `path` as UTF-8.
    ///
    /// Returns the number of bytes written. Fails rather than truncating.
    pub pwd: extern "C" fn(path: FfiBuffer<'_>) -> FfiResult<usize>,
    /// Allocate at least `size` bytes aligned to `alignment` (a power of
    /// two).
    pub malloc: extern "C" fn(size: usize, alignment: usize) -> FfiResult<*mut c_void>,
    /// Free memory from `malloc`.
    ///
    /// # Safety
    /// `ptr` must come from `malloc` on this table with the same `size` and
    /// `alignment`, and must not be freed twice.
    pub free: unsafe extern "C" fn(ptr: *mut c_void, size: usize, alignment: usize),
}

impl Api {
    /// Open a file.
    pub fn open(&self, path: &str, flags: file::Flags) -> Result<file::Handle, Error> {
        (self.open)(FfiString::new(path), flags).into()
    }

    /// Close a file.
    pub fn close(&self, fd: file::Handle) -> Result<(), Error> {
        (self.close)(fd).into()
    }

    /// Write all of `data` to a file.
    pub fn write(&self, fd: file::Handle, data: &[u8]) -> Result<(), Error> {
        (self.write)(fd, FfiByteSlice::new(data)).into()
    }

    /// Read from a file into `buffer`.
    pub fn read(&self, fd: file::Handle, buffer: &mut [u8]) -> Result<usize, Error> {
        (self.read)(fd, FfiBuffer::new(buffer)).into()
    }

    /// Seek to an absolute position.
    pub fn seek_set(&self, fd: file::Handle, position: u64) -> Result<(), Error> {
        (self.seek_set)(fd, position).into()
    }

    /// Seek relative to the current position.
    pub fn seek_cur(&self, fd: file::Handle, offset: i64) -> Result<u64, Error> {
        (self.seek_cur)(fd, offset).into()
    }

    /// Seek to the end of the file.
    pub fn seek_end(&self, fd: file::Handle) -> Result<u64, Error> {
        (self.seek_end)(fd).into()
    }

    /// Rename a file.
    pub fn rename(&self, old_path: &str, new_path: &str) -> Result<(), Error> {
        (self.rename)(FfiString::new(old_path), FfiString::new(new_path)).into()
    }

    /// Device-specific control operation.
    pub fn ioctl(&self, fd: file::Handle, command: u64, value: u64) -> Result<u64, Error> {
        (self.ioctl)(fd, command, value).into()
    }

    /// Open a directory.
    pub fn opendir(&self, path: &str) -> Result<dir::Handle, Error> {
        (self.opendir)(FfiString::new(path)).into()
    }

    /// Close a directory.
    pub fn closedir(&self, dir: dir::Handle) -> Result<(), Error> {
        (self.closedir)(dir).into()
    }

    /// Read the next directory entry.
    pub fn readdir(&self, dir: dir::Handle) -> Result<dir::Entry, Error> {
        (self.readdir)(dir).into()
    }

    /// Get information about a file.
    pub fn stat(&self, path: &str) -> Result<file::Stat, Error> {
        (self.stat)(FfiString::new(path)).into()
    }

    /// Get information about an open file.
    pub fn fstat(&self, fd: file::Handle) -> Result<file::Stat, Error> {
        (self.fstat)(fd).into()
    }

    /// Delete a file.
    pub fn deletefile(&self, path: &str) -> Result<(), Error> {
        (self.deletefile)(FfiString::new(path)).into()
    }

    /// Delete an empty directory.
    pub fn deletedir(&self, path: &str) -> Result<(), Error> {
        (self.deletedir)(FfiString::new(path)).into()
    }

    /// Change the current directory.
    pub fn chdir(&self, path: &str) -> Result<(), Error> {
        (self.chdir)(FfiString::new(path)).into()
    }

    /// Change the current directory to an open directory.
    pub fn dchdir(&self, dir: dir::Handle) -> Result<(), Error> {
        (self.dchdir)(dir).into()
    }

    /// Write the current directory into `buffer`.
    pub fn pwd(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        (self.pwd)(FfiBuffer::new(buffer)).into()
    }

    /// Allocate memory.
    pub fn malloc(&self, size: usize, alignment: usize) -> Result<*mut c_void, Error> {
        (self.malloc)(size, alignment).into()
    }

    /// Free memory.
    ///
    /// # Safety
    /// `ptr` must have come from [`Api::malloc`] on this table with the same
    /// `size` and `alignment`, and must not be used afterwards.
    pub unsafe fn free(&self, ptr: *mut c_void, size: usize, alignment: usize) {
        // SAFETY: The caller upholds the contract of the table entry.
        unsafe { (self.free)(ptr, size, alignment) }
    }
}

impl core::fmt::Debug for Api {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Api({:p})", self as *const Self)
    }
}
