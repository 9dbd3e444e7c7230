//! File Types
//!
//! Handles, open flags and metadata records for files.
//!
//! All of these are plain data with a fixed layout. They contain no
//! pointers, so they are copied by value across the boundary.

use core::fmt;

/// Represents an open file.
///
/// The value is owned by the OS. Applications only pass it back.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle(u8);

impl Handle {
    /// Pre-assigned handle for standard input.
    const STDIN: u8 = 0;
    /// Pre-assigned handle for standard output.
    const STDOUT: u8 = 1;
    /// Pre-assigned handle for standard error.
    const STDERR: u8 = 2;

    /// Create a handle from a raw value.
    ///
    /// Only the OS should do this.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// The handle for standard input.
    #[inline]
    pub const fn new_stdin() -> Self {
        Self(Self::STDIN)
    }

    /// The handle for standard output.
    #[inline]
    pub const fn new_stdout() -> Self {
        Self(Self::STDOUT)
    }

    /// The handle for standard error.
    #[inline]
    pub const fn new_stderr() -> Self {
        Self(Self::STDERR)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

bitflags::bitflags! {
    /// How a file is opened. Read access is always granted.
    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct Flags: u8 {
        /// Allow writing.
        const WRITE = 1 << 0;
        /// Create the file if it doesn't exist.
        const CREATE = 1 << 1;
        /// Empty the file when it is opened.
        const TRUNCATE = 1 << 2;
        /// Every write goes to the end of the file.
        const APPEND = 1 << 3;
    }
}

bitflags::bitflags! {
    /// File attributes, as found in a FAT directory entry.
    #[repr(transparent)]
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct Attributes: u8 {
        /// May not be written or deleted.
        const READ_ONLY = 0x01;
        /// Left out of normal listings.
        const HIDDEN = 0x02;
        /// Belongs to the operating system.
        const SYSTEM = 0x04;
        /// The volume label, not a real file.
        const VOLUME = 0x08;
        /// A directory.
        const DIRECTORY = 0x10;
        /// Changed since it was last archived.
        const ARCHIVE = 0x20;
    }
}

/// An instant in time, in the local time zone, with one-second resolution.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Time {
    /// Add 1970 to this value to get the calendar year
    pub year_since_1970: u8,
    /// Add one to this value to get the calendar month
    pub zero_indexed_month: u8,
    /// Add one to this value to get the calendar day
    pub zero_indexed_day: u8,
    /// The number of hours past midnight
    pub hours: u8,
    /// The number of minutes past the hour
    pub minutes: u8,
    /// The number of seconds past the minute
    pub seconds: u8,
}

impl Time {
    /// Midnight, 1 January 1970.
    pub const EPOCH: Self = Self {
        year_since_1970: 0,
        zero_indexed_month: 0,
        zero_indexed_day: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// The calendar year.
    #[inline]
    pub const fn year(&self) -> u16 {
        1970 + self.year_since_1970 as u16
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year(),
            self.zero_indexed_month as u16 + 1,
            self.zero_indexed_day as u16 + 1,
            self.hours,
            self.minutes,
            self.seconds
        )
    }
}

/// Describes a file on disk.
///
/// This is set up for 8.3 filenames on FAT volumes.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Stat {
    /// How big is this file
    pub file_size: u64,
    /// When was the file created
    pub ctime: Time,
    /// When was the file last modified
    pub mtime: Time,
    /// File attributes (Directory, Volume, etc)
    pub attr: Attributes,
}

impl Stat {
    /// Is this a directory?
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.attr.contains(Attributes::DIRECTORY)
    }

    /// Is this a regular file?
    #[inline]
    pub fn is_file(&self) -> bool {
        !self.attr.intersects(Attributes::DIRECTORY | Attributes::VOLUME)
    }
}
