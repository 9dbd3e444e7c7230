//! Resolved Locations
//!
//! A [`Location`] is a path after resolution: which mounted volume, and the
//! list of 8.3 names from that volume's root.

use alloc::vec::Vec;
use core::fmt;

use crate::dir::ShortName;
use crate::path::{Path, PATH_SEP, DRIVE_SEP};
use crate::Error;

/// An absolute position in the mounted volumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Index of the volume in the mount list.
    pub volume: usize,
    /// Names from the volume root. Empty means the root itself.
    pub path: Vec<ShortName>,
}

impl Location {
    pub fn new(volume: usize, path: Vec<ShortName>) -> Self {
        Self { volume, path }
    }

    /// The root directory of a volume.
    pub fn root(volume: usize) -> Self {
        Self::new(volume, Vec::new())
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Is `self` equal to `other`, or somewhere inside it?
    pub fn starts_with(&self, other: &Location) -> bool {
        self.volume == other.volume && self.path.starts_with(&other.path)
    }

    /// Resolve `path` against the current directory.
    ///
    /// # Rules
    /// - A drive specifier selects a volume through `find_volume`; an unknown
    ///   drive is `Error::NotFound`
    /// - Without one, the current directory's volume is used
    /// - Relative paths start at `cwd` when they stay on its volume, and at
    ///   the root otherwise
    /// - `.` is skipped, `..` goes up one level; going above the root is
    ///   `Error::InvalidPath`
    /// - Every other component must be a valid 8.3 name
    pub fn resolve<F>(path: &Path<'_>, cwd: &Location, find_volume: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<usize>,
    {
        let volume = match path.drive_specifier() {
            Some(drive) => find_volume(drive).ok_or(Error::NotFound)?,
            None => cwd.volume,
        };

        let mut names = if !path.is_absolute() && volume == cwd.volume {
            cwd.path.clone()
        } else {
            Vec::new()
        };

        for component in path.components() {
            match component {
                "." => {}
                ".." => {
                    names.pop().ok_or(Error::InvalidPath)?;
                }
                name => names.push(ShortName::parse(name)?),
            }
        }

        Ok(Self::new(volume, names))
    }

    /// Render as text, e.g. `/DATA/A.TXT` or `SD:/DATA`.
    pub fn display<'a>(&'a self, drive: Option<&'a str>) -> Display<'a> {
        Display {
            location: self,
            drive,
        }
    }
}

/// Helper returned by [`Location::display`].
pub struct Display<'a> {
    location: &'a Location,
    drive: Option<&'a str>,
}

impl fmt::Display for Display<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(drive) = self.drive {
            write!(f, "{}{}", drive, DRIVE_SEP)?;
        }
        if self.location.is_root() {
            return write!(f, "{}", PATH_SEP);
        }
        for name in &self.location.path {
            write!(f, "{}{}", PATH_SEP, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;
    use std::vec;

    fn name(s: &str) -> ShortName {
        ShortName::parse(s).unwrap()
    }

    fn drives(drive: &str) -> Option<usize> {
        match drive {
            "A" => Some(0),
            "B" => Some(1),
            _ => None,
        }
    }

    fn resolve(path: &str, cwd: &Location) -> Result<Location, Error> {
        Location::resolve(&Path::new(path)?, cwd, drives)
    }

    #[test]
    fn test_absolute() {
        let cwd = Location::new(0, vec![name("data")]);
        let loc = resolve("/docs/a.txt", &cwd).unwrap();
        assert_eq!(loc, Location::new(0, vec![name("docs"), name("a.txt")]));
    }

    #[test]
    fn test_relative_and_dots() {
        let cwd = Location::new(0, vec![name("data"), name("old")]);
        let loc = resolve("../new/./x.bin", &cwd).unwrap();
        assert_eq!(loc, Location::new(0, vec![name("data"), name("new"), name("x.bin")]));
    }

    #[test]
    fn test_above_root() {
        assert_eq!(resolve("/..", &Location::root(0)), Err(Error::InvalidPath));
    }

    #[test]
    fn test_drives() {
        let cwd = Location::new(0, vec![name("data")]);
        assert_eq!(resolve("B:x.txt", &cwd).unwrap(), Location::new(1, vec![name("x.txt")]));
        assert_eq!(resolve("A:x.txt", &cwd).unwrap().path.len(), 2);
        assert_eq!(resolve("Z:/x.txt", &cwd), Err(Error::NotFound));
    }

    #[test]
    fn test_bad_component() {
        assert_eq!(resolve("/toolongname.txt", &Location::root(0)), Err(Error::InvalidPath));
    }

    #[test]
    fn test_display() {
        let loc = Location::new(1, vec![name("data"), name("a.txt")]);
        assert_eq!(loc.display(None).to_string(), "/DATA/A.TXT");
        assert_eq!(loc.display(Some("SD")).to_string(), "SD:/DATA/A.TXT");
        assert_eq!(Location::root(0).display(None).to_string(), "/");
    }

    #[test]
    fn test_starts_with() {
        let dir = Location::new(0, vec![name("data")]);
        let inner = Location::new(0, vec![name("data"), name("a.txt")]);
        assert!(inner.starts_with(&dir));
        assert!(dir.starts_with(&dir));
        assert!(!dir.starts_with(&inner));
        assert!(!Location::root(1).starts_with(&Location::root(0)));
    }
}
