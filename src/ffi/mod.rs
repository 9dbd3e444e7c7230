//! Boundary Wire Types
//!
//! Fixed-layout values passed by value between an application and the OS.
//!
//! # Design
//! - Every type is `#[repr(C)]` or `#[repr(transparent)]`
//! - Borrowed views are two machine words and carry the caller's lifetime,
//!   so a callee cannot keep one past the call without `unsafe`
//! - Fallible results are a real sum type, never a sentinel value

mod view;

pub use view::{FfiBuffer, FfiByteSlice, FfiString};

use crate::Error;

/// The result of every fallible operation in the table.
///
/// `core::result::Result` has no stable layout, so the table uses this
/// instead. Convert it with [`FfiResult::into_result`] (or `.into()`) before
/// doing anything with the payload.
#[repr(C)]
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiResult<T> {
    /// The operation succeeded (like `core::result::Result::Ok`).
    Ok(T),
    /// The operation failed (like `core::result::Result::Err`).
    Err(Error),
}

impl<T> FfiResult<T> {
    /// Convert into a standard `Result`.
    #[inline]
    pub fn into_result(self) -> Result<T, Error> {
        match self {
            FfiResult::Ok(value) => Ok(value),
            FfiResult::Err(e) => Err(e),
        }
    }

    /// Did the operation succeed?
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, FfiResult::Ok(_))
    }

    /// Did the operation fail?
    #[inline]
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }
}

impl<T> From<Result<T, Error>> for FfiResult<T> {
    #[inline]
    fn from(value: Result<T, Error>) -> Self {
        match value {
            Ok(value) => FfiResult::Ok(value),
            Err(e) => FfiResult::Err(e),
        }
    }
}

impl<T> From<FfiResult<T>> for Result<T, Error> {
    #[inline]
    fn from(value: FfiResult<T>) -> Self {
        value.into_result()
    }
}
