//! Directory Types
//!
//! Directory handles, directory entries and the 8.3 short names they carry.
//!
//! # Short Names
//! A name is stored the way a FAT directory stores it: 8 bytes of base
//! name and 3 bytes of extension, both space padded, upper-case ASCII.
//! That is exactly `MAX_FILENAME_LEN` bytes. Unicode names are not
//! supported.

use core::fmt;

use crate::file::Stat;
use crate::{Error, MAX_FILENAME_LEN};

/// Represents an open directory.
///
/// Not interchangeable with [`crate::file::Handle`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Handle(u8);

impl Handle {
    /// Create a handle from a raw value.
    ///
    /// Only the OS should do this.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// Length of the base part of a short name.
const BASE_LEN: usize = 8;

/// Length of the extension part of a short name.
const EXT_LEN: usize = 3;

/// Punctuation FAT allows in a short name, besides letters and digits.
const SPECIAL_CHARS: &[u8] = b"!#$%&'()-@^_`{}~";

/// An 8.3 file name in on-disk form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ShortName([u8; MAX_FILENAME_LEN]);

impl ShortName {
    /// Parse a name such as `readme.txt`.
    ///
    /// Lower-case letters are folded to upper case. Fails with
    /// `Error::InvalidPath` if the name doesn't fit the 8.3 rules.
    pub fn parse(name: &str) -> Result<Self, Error> {
        let (base, ext) = match name.split_once('.') {
            Some((base, ext)) => (base, ext),
            None => (name, ""),
        };

        if base.is_empty() || base.len() > BASE_LEN || ext.len() > EXT_LEN {
            return Err(Error::InvalidPath);
        }

        let mut raw = [b' '; MAX_FILENAME_LEN];
        for (dst, &b) in raw[..BASE_LEN].iter_mut().zip(base.as_bytes()) {
            *dst = Self::check_char(b)?;
        }
        for (dst, &b) in raw[BASE_LEN..].iter_mut().zip(ext.as_bytes()) {
            *dst = Self::check_char(b)?;
        }

        Ok(Self(raw))
    }

    /// Wrap raw on-disk bytes without checking them.
    #[inline]
    pub const fn from_bytes(raw: [u8; MAX_FILENAME_LEN]) -> Self {
        Self(raw)
    }

    /// The raw on-disk bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; MAX_FILENAME_LEN] {
        &self.0
    }

    /// The base name, without padding.
    pub fn base(&self) -> &str {
        Self::trimmed(&self.0[..BASE_LEN])
    }

    /// The extension, without padding. Empty if there is none.
    pub fn extension(&self) -> &str {
        Self::trimmed(&self.0[BASE_LEN..])
    }

    fn check_char(b: u8) -> Result<u8, Error> {
        if b.is_ascii_alphanumeric() || SPECIAL_CHARS.contains(&b) {
            Ok(b.to_ascii_uppercase())
        } else {
            Err(Error::InvalidPath)
        }
    }

    fn trimmed(bytes: &[u8]) -> &str {
        let end = bytes
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |last| last + 1);
        core::str::from_utf8(&bytes[..end]).unwrap_or("?")
    }
}

impl fmt::Display for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ext = self.extension();
        if ext.is_empty() {
            write!(f, "{}", self.base())
        } else {
            write!(f, "{}.{}", self.base(), ext)
        }
    }
}

impl fmt::Debug for ShortName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortName({})", self)
    }
}

/// Describes an entry in a directory.
///
/// This is set up for 8.3 filenames on FAT volumes.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Entry {
    /// The name and extension of the file, in on-disk 8.3 form.
    pub name: [u8; MAX_FILENAME_LEN],
    /// The properties for the file/directory this entry represents.
    pub properties: Stat,
}

impl Entry {
    /// Build an entry from a name and its metadata.
    #[inline]
    pub const fn new(name: ShortName, properties: Stat) -> Self {
        Self {
            name: name.0,
            properties,
        }
    }

    /// The entry's name.
    #[inline]
    pub const fn short_name(&self) -> ShortName {
        ShortName(self.name)
    }

    /// Is this entry a directory?
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.properties.is_dir()
    }
}
