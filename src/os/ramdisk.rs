//! RAM Volume
//!
//! An in-memory FAT-like volume: 8.3 names, attribute bytes, entries kept
//! in creation order.
//!
//! Every node takes a slot number from a volume-wide counter when it is
//! linked into a directory. Siblings stay sorted by slot, so a listing
//! cursor is just the next slot to look at and survives deletes and
//! renames. Renaming in place keeps the slot; moving to another directory
//! takes a fresh one.
//!
//! Used for hosted builds and tests, and as the reference for how a
//! [`Volume`] reports errors. An optional byte capacity models a full
//! disk.

use alloc::vec::Vec;

use crate::dir::{Entry, ShortName};
use crate::file::{Attributes, Stat, Time};
use crate::Error;

use super::volume::Volume;

#[derive(Debug)]
enum Content {
    File(Vec<u8>),
    Dir(Vec<Node>),
}

#[derive(Debug)]
struct Node {
    /// Position in the parent directory. Never reused.
    slot: u64,
    name: ShortName,
    ctime: Time,
    mtime: Time,
    attr: Attributes,
    content: Content,
}

impl Node {
    fn new_file(name: ShortName, now: Time) -> Self {
        Self {
            slot: 0,
            name,
            ctime: now,
            mtime: now,
            attr: Attributes::ARCHIVE,
            content: Content::File(Vec::new()),
        }
    }

    fn new_dir(name: ShortName, now: Time) -> Self {
        Self {
            slot: 0,
            name,
            ctime: now,
            mtime: now,
            attr: Attributes::DIRECTORY,
            content: Content::Dir(Vec::new()),
        }
    }

    fn stat(&self) -> Stat {
        let file_size = match &self.content {
            Content::File(data) => data.len() as u64,
            Content::Dir(_) => 0,
        };
        Stat {
            file_size,
            ctime: self.ctime,
            mtime: self.mtime,
            attr: self.attr,
        }
    }

    fn children(&self) -> Result<&Vec<Node>, Error> {
        match &self.content {
            Content::Dir(children) => Ok(children),
            Content::File(_) => Err(Error::InvalidPath),
        }
    }

    fn children_mut(&mut self) -> Result<&mut Vec<Node>, Error> {
        match &mut self.content {
            Content::Dir(children) => Ok(children),
            Content::File(_) => Err(Error::InvalidPath),
        }
    }

    fn data(&self) -> Result<&Vec<u8>, Error> {
        match &self.content {
            Content::File(data) => Ok(data),
            Content::Dir(_) => Err(Error::InvalidPath),
        }
    }

    fn data_mut(&mut self) -> Result<&mut Vec<u8>, Error> {
        match &mut self.content {
            Content::File(data) => Ok(data),
            Content::Dir(_) => Err(Error::InvalidPath),
        }
    }
}

/// Split a path into its last name and the parent directory.
fn split(path: &[ShortName]) -> Result<(&ShortName, &[ShortName]), Error> {
    path.split_last().ok_or(Error::InvalidPath)
}

/// An in-memory volume.
#[derive(Debug)]
pub struct RamVolume {
    root: Node,
    /// Maximum bytes of file data (None = unlimited).
    capacity: Option<usize>,
    /// Bytes of file data currently stored.
    used: usize,
    /// Slot for the next linked node.
    next_slot: u64,
}

impl RamVolume {
    /// Create an empty volume with no size limit.
    pub fn new() -> Self {
        Self {
            root: Node::new_dir(ShortName::from_bytes([b' '; crate::MAX_FILENAME_LEN]), Time::EPOCH),
            capacity: None,
            used: 0,
            next_slot: 1,
        }
    }

    /// Create an empty volume that holds at most `bytes` of file data.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            capacity: Some(bytes),
            ..Self::new()
        }
    }

    /// Bytes of file data currently stored.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Replace the attribute byte of a file or directory.
    ///
    /// The directory bit can't be changed this way.
    pub fn set_attributes(&mut self, path: &[ShortName], attr: Attributes) -> Result<(), Error> {
        let node = self.find_mut(path)?;
        let dir_bit = node.attr & Attributes::DIRECTORY;
        node.attr = (attr - Attributes::DIRECTORY) | dir_bit;
        Ok(())
    }

    fn find(&self, path: &[ShortName]) -> Result<&Node, Error> {
        let mut node = &self.root;
        for name in path {
            node = node
                .children()?
                .iter()
                .find(|child| child.name == *name)
                .ok_or(Error::NotFound)?;
        }
        Ok(node)
    }

    fn find_mut(&mut self, path: &[ShortName]) -> Result<&mut Node, Error> {
        let mut node = &mut self.root;
        for name in path {
            node = node
                .children_mut()?
                .iter_mut()
                .find(|child| child.name == *name)
                .ok_or(Error::NotFound)?;
        }
        Ok(node)
    }

    /// Check that `grow` more bytes fit.
    fn reserve(&self, grow: usize) -> Result<(), Error> {
        match self.capacity {
            Some(capacity) if self.used.saturating_add(grow) > capacity => Err(Error::DeviceSpecific),
            _ => Ok(()),
        }
    }

    /// Link `node` at the end of its parent under a fresh slot.
    fn insert(&mut self, path: &[ShortName], mut node: Node) -> Result<(), Error> {
        let (_, parent) = split(path)?;
        node.slot = self.next_slot;
        let siblings = self.find_mut(parent)?.children_mut()?;
        if siblings.iter().any(|child| child.name == node.name) {
            return Err(Error::InvalidArg);
        }
        siblings.push(node);
        self.next_slot += 1;
        Ok(())
    }

    fn detach(&mut self, path: &[ShortName]) -> Result<Node, Error> {
        let (name, parent) = split(path)?;
        let siblings = self.find_mut(parent)?.children_mut()?;
        let idx = siblings
            .iter()
            .position(|child| child.name == *name)
            .ok_or(Error::NotFound)?;
        Ok(siblings.remove(idx))
    }

    /// Resize file data to `len`, enforcing the capacity.
    fn resize(&mut self, path: &[ShortName], len: usize) -> Result<(), Error> {
        let current = self.find(path)?.data()?.len();
        let grow = len.saturating_sub(current);
        self.reserve(grow)?;

        let data = self.find_mut(path)?.data_mut()?;
        if len > data.len() {
            data.try_reserve(len - data.len())
                .map_err(|_| Error::DeviceSpecific)?;
        }
        data.resize(len, 0);

        self.used = self.used - (current - current.min(len)) + grow;
        Ok(())
    }
}

impl Default for RamVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl Volume for RamVolume {
    fn stat(&self, path: &[ShortName]) -> Result<Stat, Error> {
        Ok(self.find(path)?.stat())
    }

    fn create_file(&mut self, path: &[ShortName], now: Time) -> Result<(), Error> {
        let (name, _) = split(path)?;
        self.insert(path, Node::new_file(*name, now))
    }

    fn create_dir(&mut self, path: &[ShortName], now: Time) -> Result<(), Error> {
        let (name, _) = split(path)?;
        self.insert(path, Node::new_dir(*name, now))
    }

    fn read_at(&self, path: &[ShortName], offset: u64, buffer: &mut [u8]) -> Result<usize, Error> {
        let data = self.find(path)?.data()?;
        let offset = match usize::try_from(offset) {
            Ok(offset) if offset < data.len() => offset,
            _ => return Ok(0),
        };
        let count = buffer.len().min(data.len() - offset);
        buffer[..count].copy_from_slice(&data[offset..offset + count]);
        Ok(count)
    }

    fn write_at(&mut self, path: &[ShortName], offset: u64, data: &[u8]) -> Result<(), Error> {
        let offset = usize::try_from(offset).map_err(|_| Error::InvalidArg)?;
        let end = offset.checked_add(data.len()).ok_or(Error::InvalidArg)?;

        let current = self.find(path)?.data()?.len();
        if end > current {
            self.resize(path, end)?;
        }

        let file = self.find_mut(path)?.data_mut()?;
        file[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn set_len(&mut self, path: &[ShortName], len: u64) -> Result<(), Error> {
        let len = usize::try_from(len).map_err(|_| Error::DeviceSpecific)?;
        self.resize(path, len)
    }

    fn entry(&self, dir: &[ShortName], cursor: u64) -> Result<(Entry, u64), Error> {
        self.find(dir)?
            .children()?
            .iter()
            .find(|node| node.slot >= cursor)
            .map(|node| (Entry::new(node.name, node.stat()), node.slot + 1))
            .ok_or(Error::EndOfFile)
    }

    fn rename(&mut self, from: &[ShortName], to: &[ShortName]) -> Result<(), Error> {
        let (new_name, new_parent) = split(to)?;
        self.find(from)?;
        if from.is_empty() {
            return Err(Error::InvalidPath);
        }
        if from == to {
            return Ok(());
        }
        // A directory can't move inside itself
        if to.starts_with(from) {
            return Err(Error::InvalidArg);
        }
        if self
            .find(new_parent)?
            .children()?
            .iter()
            .any(|child| child.name == *new_name)
        {
            return Err(Error::InvalidArg);
        }

        let (_, old_parent) = split(from)?;
        if old_parent == new_parent {
            self.find_mut(from)?.name = *new_name;
            return Ok(());
        }
        let mut node = self.detach(from)?;
        node.name = *new_name;
        self.insert(to, node)
    }

    fn remove_file(&mut self, path: &[ShortName]) -> Result<(), Error> {
        let size = self.find(path)?.data()?.len();
        self.detach(path)?;
        self.used -= size;
        Ok(())
    }

    fn remove_dir(&mut self, path: &[ShortName]) -> Result<(), Error> {
        if path.is_empty() {
            return Err(Error::InvalidPath);
        }
        if !self.find(path)?.children()?.is_empty() {
            return Err(Error::InvalidArg);
        }
        self.detach(path)?;
        Ok(())
    }

    fn sync(&mut self, path: &[ShortName], now: Time) -> Result<(), Error> {
        let node = self.find_mut(path)?;
        if let Content::File(_) = node.content {
            node.mtime = now;
            node.attr |= Attributes::ARCHIVE;
        }
        Ok(())
    }
}
