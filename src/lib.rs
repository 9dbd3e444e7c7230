//! PantherOS Application ABI
//!
//! The boundary between PantherOS and the applications it loads: a fixed
//! table of operations (file I/O, directories, paths, memory) and the
//! fixed-layout types that cross it.
//!
//! # Layers
//! - Wire types: borrowed views, tagged results, handles, metadata records
//! - Error taxonomy: one closed [`Error`] enumeration
//! - Operation table: [`Api`], handed to an application once at start-up
//!
//! # Halves
//! - [`app`]: safe wrappers an application builds on its [`Api`]
//! - [`os`]: a reference runtime that implements every operation on an
//!   explicit [`os::Context`] and publishes it as an [`Api`]
//!
//! # ABI Rules
//! - No `core::result::Result`, `Option`, `&[u8]` or `&str` cross the
//!   boundary; only `#[repr(C)]` equivalents do
//! - Views are borrowed for one call and never kept by the callee
//! - Every failure is one of the nine [`Error`] values

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod api;
pub mod app;
pub mod dir;
mod error;
pub mod ffi;
pub mod file;
pub mod os;
pub mod path;

pub use api::Api;
pub use error::Error;
pub use ffi::{FfiBuffer, FfiByteSlice, FfiResult, FfiString};

/// Maximum length of a filename (with no directory components), including
/// the extension.
pub const MAX_FILENAME_LEN: usize = 11;

/// The type of an application's entry point. The OS calls it with the
/// table and the application's exit code comes back.
pub type AppStartFn = extern "C" fn(api: &'static Api) -> i32;

// Layout is part of the ABI. Catch accidental changes at compile time.
static_assertions::assert_eq_size!(file::Handle, u8);
static_assertions::assert_eq_size!(dir::Handle, u8);
static_assertions::assert_eq_size!(file::Flags, u8);
static_assertions::assert_eq_size!(file::Attributes, u8);
static_assertions::assert_eq_size!(FfiByteSlice<'static>, [usize; 2]);
static_assertions::assert_eq_size!(FfiString<'static>, [usize; 2]);
static_assertions::assert_eq_size!(FfiBuffer<'static>, [usize; 2]);
static_assertions::const_assert_eq!(core::mem::size_of::<file::Time>(), 6);
static_assertions::const_assert_eq!(core::mem::size_of::<file::Stat>(), 24);
static_assertions::const_assert_eq!(core::mem::size_of::<dir::Entry>(), 40);
static_assertions::const_assert_eq!(core::mem::size_of::<Api>(), 21 * core::mem::size_of::<usize>());
