//! Storage Volumes
//!
//! The seam between the runtime and a filesystem implementation.
//!
//! A volume addresses everything by its list of 8.3 names from the root.
//! It knows nothing about handles, cursors or the current directory; the
//! [`super::Context`] keeps those.
//!
//! # Error Conventions
//! - Missing entry or parent: `Error::NotFound`
//! - Wrong kind (a file where a directory is needed, or the reverse):
//!   `Error::InvalidPath`
//! - Name already taken, directory not empty: `Error::InvalidArg`
//! - Storage full or media failure: `Error::DeviceSpecific`

use crate::dir::{Entry, ShortName};
use crate::file::{Stat, Time};
use crate::Error;

/// A mounted filesystem.
pub trait Volume: Send {
    /// Metadata for a file or directory. The empty path is the root.
    fn stat(&self, path: &[ShortName]) -> Result<Stat, Error>;

    /// Create an empty file.
    fn create_file(&mut self, path: &[ShortName], now: Time) -> Result<(), Error>;

    /// Create an empty directory.
    fn create_dir(&mut self, path: &[ShortName], now: Time) -> Result<(), Error>;

    /// Read from `offset` into `buffer`. Returns 0 at or past the end.
    fn read_at(&self, path: &[ShortName], offset: u64, buffer: &mut [u8]) -> Result<usize, Error>;

    /// Write all of `data` at `offset`, growing the file as needed.
    ///
    /// Any gap between the old end and `offset` is zero-filled. Either
    /// everything is written or nothing is.
    fn write_at(&mut self, path: &[ShortName], offset: u64, data: &[u8]) -> Result<(), Error>;

    /// Truncate or zero-extend a file.
    fn set_len(&mut self, path: &[ShortName], len: u64) -> Result<(), Error>;

    /// The first entry of a directory at or after `cursor`, with the cursor
    /// for the one after it. `Error::EndOfFile` when there are no more.
    ///
    /// A listing starts at cursor 0. Cursors must stay valid while entries
    /// are created, removed or renamed: an entry present for the whole walk
    /// is returned exactly once.
    fn entry(&self, dir: &[ShortName], cursor: u64) -> Result<(Entry, u64), Error>;

    /// Move a file or directory within this volume.
    fn rename(&mut self, from: &[ShortName], to: &[ShortName]) -> Result<(), Error>;

    /// Delete a file.
    fn remove_file(&mut self, path: &[ShortName]) -> Result<(), Error>;

    /// Delete an empty directory.
    fn remove_dir(&mut self, path: &[ShortName]) -> Result<(), Error>;

    /// Flush the directory entry of a file. Called when it is closed.
    fn sync(&mut self, path: &[ShortName], now: Time) -> Result<(), Error>;
}
