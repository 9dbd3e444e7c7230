//! Error Taxonomy
//!
//! The closed set of failure reasons shared by every fallible operation in
//! the application/OS boundary.
//!
//! # Design
//! - One process-wide enumeration, no per-operation error types
//! - `#[repr(C)]` so the discriminant layout matches a C `enum`
//! - New failure causes are mapped onto the closest existing member

/// Describes how an operation has failed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error {
    /// The given file/directory path was not found.
    NotFound,
    /// Tried to write to a read-only file.
    FileReadOnly,
    /// Reached the end of the file.
    EndOfFile,
    /// The operation has not been implemented.
    Unimplemented,
    /// An invalid argument was given to the operation.
    InvalidArg,
    /// A bad handle was given to the operation.
    BadHandle,
    /// A device-specific error occurred (e.g. the storage is full).
    DeviceSpecific,
    /// The OS does not have enough memory.
    OutOfMemory,
    /// The given path was invalid.
    InvalidPath,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::FileReadOnly => write!(f, "file is read-only"),
            Self::EndOfFile => write!(f, "end of file"),
            Self::Unimplemented => write!(f, "not implemented"),
            Self::InvalidArg => write!(f, "invalid argument"),
            Self::BadHandle => write!(f, "bad handle"),
            Self::DeviceSpecific => write!(f, "device-specific error"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::InvalidPath => write!(f, "invalid path"),
        }
    }
}
