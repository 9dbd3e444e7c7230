//! Handle Table
//!
//! Maps the one-byte handles given to applications onto the OS objects
//! behind them.
//!
//! # Design
//! - Fixed-size array of slots, addressed by the raw handle value
//! - Slots 0..=2 hold the console streams (stdin, stdout, stderr)
//! - New handles take the first free slot from [`Slot::FIRST_USER`]
//! - Lookups are typed: a directory handle given to a file operation is
//!   `Error::BadHandle`

use crate::file::Flags;
use crate::Error;

use super::location::Location;

/// Number of slots in the table. Must fit in a `u8` handle.
pub const MAX_HANDLES: usize = 32;

/// A slot index in the table.
///
/// This is a newtype so arbitrary integers can't be used as indices.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(transparent)]
pub struct Slot(u8);

impl Slot {
    /// Create a slot index.
    ///
    /// Returns None if the index is out of range.
    #[inline]
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < MAX_HANDLES {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Get the index value.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw handle value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Reserved slot for standard input.
    pub const STDIN: Self = Self(0);

    /// Reserved slot for standard output.
    pub const STDOUT: Self = Self(1);

    /// Reserved slot for standard error.
    pub const STDERR: Self = Self(2);

    /// First slot handed out by `open`/`opendir`.
    pub const FIRST_USER: Self = Self(3);
}

/// A file opened with `open`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenFile {
    pub location: Location,
    pub position: u64,
    pub flags: Flags,
}

/// A directory opened with `opendir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenDir {
    pub location: Location,
    /// Volume cursor for the next entry `readdir` returns.
    pub cursor: u64,
    /// Set once `readdir` has reported end-of-file. There is no rewind.
    pub exhausted: bool,
}

/// What a slot holds.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum Object {
    #[default]
    Empty,
    Console,
    File(OpenFile),
    Dir(OpenDir),
}

impl Object {
    /// Check if this is an empty slot.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Object::Empty)
    }

    /// Where on disk this object lives, if anywhere.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Object::File(f) => Some(&f.location),
            Object::Dir(d) => Some(&d.location),
            Object::Empty | Object::Console => None,
        }
    }
}

/// The table of live handles for the whole system.
#[derive(Debug)]
pub struct HandleTable {
    slots: [Object; MAX_HANDLES],
}

impl HandleTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| Object::Empty),
        }
    }

    fn slot(raw: u8) -> Result<Slot, Error> {
        Slot::new(raw).ok_or(Error::BadHandle)
    }

    /// Look up the object behind a handle.
    #[inline]
    pub fn get(&self, raw: u8) -> Result<&Object, Error> {
        let obj = &self.slots[Self::slot(raw)?.index()];
        if obj.is_empty() {
            Err(Error::BadHandle)
        } else {
            Ok(obj)
        }
    }

    /// Look up the object behind a handle, mutably.
    #[inline]
    pub fn get_mut(&mut self, raw: u8) -> Result<&mut Object, Error> {
        let obj = &mut self.slots[Self::slot(raw)?.index()];
        if obj.is_empty() {
            Err(Error::BadHandle)
        } else {
            Ok(obj)
        }
    }

    /// Look up an open file.
    pub fn file_mut(&mut self, raw: u8) -> Result<&mut OpenFile, Error> {
        match self.get_mut(raw)? {
            Object::File(f) => Ok(f),
            _ => Err(Error::BadHandle),
        }
    }

    /// Look up an open directory.
    pub fn dir_mut(&mut self, raw: u8) -> Result<&mut OpenDir, Error> {
        match self.get_mut(raw)? {
            Object::Dir(d) => Ok(d),
            _ => Err(Error::BadHandle),
        }
    }

    /// Put an object into a specific slot.
    ///
    /// Fails if the slot is already occupied.
    pub fn insert(&mut self, slot: Slot, obj: Object) -> Result<(), Error> {
        if !self.slots[slot.index()].is_empty() {
            return Err(Error::BadHandle);
        }
        self.slots[slot.index()] = obj;
        Ok(())
    }

    /// Find a free slot.
    ///
    /// Returns the first empty slot >= start_from.
    pub fn find_free(&self, start_from: Slot) -> Option<Slot> {
        (start_from.index()..MAX_HANDLES)
            .find(|&i| self.slots[i].is_empty())
            .map(|i| Slot(i as u8))
    }

    /// Put an object into the first free user slot.
    ///
    /// A full table is `Error::OutOfMemory`.
    pub fn allocate(&mut self, obj: Object) -> Result<Slot, Error> {
        let slot = self.find_free(Slot::FIRST_USER).ok_or(Error::OutOfMemory)?;
        self.slots[slot.index()] = obj;
        Ok(slot)
    }

    /// Empty a slot.
    ///
    /// Returns the removed object, or error if the slot is empty.
    pub fn remove(&mut self, raw: u8) -> Result<Object, Error> {
        let slot = Self::slot(raw)?;
        if self.slots[slot.index()].is_empty() {
            return Err(Error::BadHandle);
        }
        Ok(core::mem::take(&mut self.slots[slot.index()]))
    }

    /// Is there an open file at exactly this location?
    pub fn is_file_open(&self, location: &Location) -> bool {
        self.slots
            .iter()
            .any(|obj| matches!(obj, Object::File(f) if f.location == *location))
    }

    /// Is any file or directory open at or below this location?
    pub fn any_within(&self, location: &Location) -> bool {
        self.slots
            .iter()
            .filter_map(Object::location)
            .any(|open| open.starts_with(location))
    }

    /// Number of occupied slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|obj| !obj.is_empty()).count()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}
