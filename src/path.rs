//! Path Syntax
//!
//! Paths look like `/DIR/FILE.TXT`, `DIR/FILE.TXT` or `SD:/DIR/FILE.TXT`.
//!
//! # Rules
//! - Components are separated by [`PATH_SEP`]
//! - An optional drive specifier comes first and ends with [`DRIVE_SEP`]
//! - A path starting with [`PATH_SEP`] (after any drive) is absolute
//!
//! This module only checks the syntax. Whether a component is a valid
//! file name is up to the filesystem on the drive.

use crate::Error;

/// The character that separates one directory name from another.
pub const PATH_SEP: char = '/';

/// The character that separates a drive specifier from the directories.
pub const DRIVE_SEP: char = ':';

/// A syntactically valid path, borrowed from the caller.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Path<'a>(&'a str);

impl<'a> Path<'a> {
    /// Check `path` and wrap it.
    ///
    /// Fails with `Error::InvalidPath` if the path is empty, has more than
    /// one drive separator, an empty drive name, or a drive separator after
    /// a directory separator.
    pub fn new(path: &'a str) -> Result<Self, Error> {
        if path.is_empty() {
            return Err(Error::InvalidPath);
        }

        if let Some(idx) = path.find(DRIVE_SEP) {
            let (drive, rest) = path.split_at(idx);
            if drive.is_empty() || drive.contains(PATH_SEP) {
                return Err(Error::InvalidPath);
            }
            if rest[1..].contains(DRIVE_SEP) {
                return Err(Error::InvalidPath);
            }
        }

        Ok(Self(path))
    }

    /// The full path as given.
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// The drive specifier, e.g. `SD` in `SD:/FILE.TXT`.
    pub fn drive_specifier(&self) -> Option<&'a str> {
        self.0.split_once(DRIVE_SEP).map(|(drive, _)| drive)
    }

    /// Everything after the drive specifier.
    pub fn without_drive(&self) -> &'a str {
        match self.0.split_once(DRIVE_SEP) {
            Some((_, rest)) => rest,
            None => self.0,
        }
    }

    /// Does the path start at the root of a drive?
    pub fn is_absolute(&self) -> bool {
        self.without_drive().starts_with(PATH_SEP)
    }

    /// The non-empty components, in order.
    pub fn components(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.without_drive()
            .split(PATH_SEP)
            .filter(|c| !c.is_empty())
    }

    /// The last component, if the path doesn't end in a separator.
    pub fn filename(&self) -> Option<&'a str> {
        let rest = self.without_drive();
        match rest.rsplit_once(PATH_SEP) {
            Some((_, name)) if !name.is_empty() => Some(name),
            Some(_) => None,
            None if !rest.is_empty() => Some(rest),
            None => None,
        }
    }

    /// Everything before the last component, without the drive.
    pub fn directory(&self) -> &'a str {
        let rest = self.without_drive();
        match rest.rsplit_once(PATH_SEP) {
            Some(("", _)) => "/",
            Some((dir, _)) => dir,
            None => "",
        }
    }

    /// The extension of the last component, if it has one.
    pub fn extension(&self) -> Option<&'a str> {
        self.filename()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

impl core::fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    #[test]
    fn test_absolute_with_drive() {
        let p = Path::new("SD:/DOCS/README.TXT").unwrap();
        assert_eq!(p.drive_specifier(), Some("SD"));
        assert!(p.is_absolute());
        assert_eq!(p.components().collect::<Vec<_>>(), ["DOCS", "README.TXT"]);
        assert_eq!(p.filename(), Some("README.TXT"));
        assert_eq!(p.directory(), "/DOCS");
        assert_eq!(p.extension(), Some("TXT"));
    }

    #[test]
    fn test_relative() {
        let p = Path::new("docs/a.txt").unwrap();
        assert_eq!(p.drive_specifier(), None);
        assert!(!p.is_absolute());
        assert_eq!(p.directory(), "docs");
        assert_eq!(p.filename(), Some("a.txt"));
    }

    #[test]
    fn test_root_and_trailing_separator() {
        let root = Path::new("/").unwrap();
        assert!(root.is_absolute());
        assert_eq!(root.components().count(), 0);
        assert_eq!(root.filename(), None);

        let dir = Path::new("/data/").unwrap();
        assert_eq!(dir.filename(), None);
        assert_eq!(dir.components().collect::<Vec<_>>(), ["data"]);

        assert_eq!(Path::new("/a.txt").unwrap().directory(), "/");
    }

    #[test]
    fn test_drive_relative() {
        let p = Path::new("B:notes.txt").unwrap();
        assert_eq!(p.drive_specifier(), Some("B"));
        assert!(!p.is_absolute());
        assert_eq!(p.filename(), Some("notes.txt"));
    }

    #[test]
    fn test_invalid() {
        assert_eq!(Path::new(""), Err(Error::InvalidPath));
        assert_eq!(Path::new(":/x"), Err(Error::InvalidPath));
        assert_eq!(Path::new("A:/x:y"), Err(Error::InvalidPath));
        assert_eq!(Path::new("/a/b:c"), Err(Error::InvalidPath));
    }
}
