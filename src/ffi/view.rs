//! Borrowed Views
//!
//! Non-owning (pointer, length) views over memory owned by the caller of an
//! operation. A view is only valid until the callee returns.
//!
//! # Validation
//! The callee never trusts a view blindly. Before turning one into a slice
//! it checks:
//! 1. A null pointer is only accepted with a zero length
//! 2. The length fits in `isize`
//! 3. Pointer + length doesn't overflow the address space
//!
//! Anything else is `Error::InvalidArg`.

use core::marker::PhantomData;

use crate::Error;

/// Check a raw (pointer, length) pair before it is turned into a slice.
fn validate(ptr: usize, len: usize) -> Result<(), Error> {
    // Zero-length views are always valid
    if len == 0 {
        return Ok(());
    }

    if ptr == 0 {
        return Err(Error::InvalidArg);
    }

    if len > isize::MAX as usize {
        return Err(Error::InvalidArg);
    }

    ptr.checked_add(len).ok_or(Error::InvalidArg)?;

    Ok(())
}

/// A read-only byte view, FFI-compatible with `const uint8_t *, uintptr_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FfiByteSlice<'a> {
    /// A pointer to the data
    data: *const u8,
    /// The number of bytes we are pointing at
    data_len: usize,
    _phantom: PhantomData<&'a [u8]>,
}

impl<'a> FfiByteSlice<'a> {
    /// Borrow a slice for the duration of one call.
    #[inline]
    pub const fn new(slice: &'a [u8]) -> Self {
        Self {
            data: slice.as_ptr(),
            data_len: slice.len(),
            _phantom: PhantomData,
        }
    }

    /// An empty view.
    #[inline]
    pub const fn empty() -> Self {
        Self::new(&[])
    }

    /// Number of bytes in the view.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data_len
    }

    /// Is the view empty?
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data_len == 0
    }

    /// Turn the view back into a slice, validating it first.
    pub fn as_slice(&self) -> Result<&'a [u8], Error> {
        validate(self.data as usize, self.data_len)?;
        if self.data_len == 0 {
            return Ok(&[]);
        }
        // SAFETY:
        // - Pointer is non-null and pointer + length doesn't overflow
        // - The safe constructor took a `&'a [u8]`; foreign callers promise
        //   the same by the calling convention of the table
        unsafe { Ok(core::slice::from_raw_parts(self.data, self.data_len)) }
    }
}

impl<'a> From<&'a [u8]> for FfiByteSlice<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Self::new(slice)
    }
}

/// A read-only UTF-8 text view. Not null-terminated.
///
/// The UTF-8 guarantee is part of the calling contract, so the callee checks
/// it again in [`FfiString::as_str`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
pub struct FfiString<'a>(FfiByteSlice<'a>);

impl<'a> FfiString<'a> {
    /// Borrow a string for the duration of one call.
    #[inline]
    pub const fn new(s: &'a str) -> Self {
        Self(FfiByteSlice::new(s.as_bytes()))
    }

    /// Number of bytes in the string.
    #[inline]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the string empty?
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Turn the view back into a `&str`.
    pub fn as_str(&self) -> Result<&'a str, Error> {
        let bytes = self.0.as_slice()?;
        core::str::from_utf8(bytes).map_err(|_| Error::InvalidArg)
    }
}

impl<'a> From<&'a str> for FfiString<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s)
    }
}

/// A mutable byte view the callee may write into, FFI-compatible with
/// `uint8_t *, uintptr_t`.
#[repr(C)]
#[derive(Debug)]
pub struct FfiBuffer<'a> {
    /// A pointer to where the data can be put
    data: *mut u8,
    /// The maximum number of bytes we can store in this buffer
    data_len: usize,
    _phantom: PhantomData<&'a mut [u8]>,
}

impl<'a> FfiBuffer<'a> {
    /// Lend a mutable slice for the duration of one call.
    #[inline]
    pub fn new(slice: &'a mut [u8]) -> Self {
        Self {
            data: slice.as_mut_ptr(),
            data_len: slice.len(),
            _phantom: PhantomData,
        }
    }

    /// Capacity of the buffer in bytes.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.data_len
    }

    /// Turn the view back into a mutable slice, validating it first.
    ///
    /// Takes `self` by value: the buffer is lent exactly once.
    pub fn into_mut_slice(self) -> Result<&'a mut [u8], Error> {
        validate(self.data as usize, self.data_len)?;
        if self.data_len == 0 {
            return Ok(&mut []);
        }
        // SAFETY: Same as FfiByteSlice::as_slice, plus the safe constructor
        // took a unique `&'a mut [u8]` and this view is consumed here.
        unsafe { Ok(core::slice::from_raw_parts_mut(self.data, self.data_len)) }
    }
}

impl<'a> From<&'a mut [u8]> for FfiBuffer<'a> {
    fn from(slice: &'a mut [u8]) -> Self {
        Self::new(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length() {
        assert!(validate(0, 0).is_ok());
        assert_eq!(FfiByteSlice::empty().as_slice(), Ok(&[][..]));
    }

    #[test]
    fn test_null_pointer() {
        assert_eq!(validate(0, 100), Err(Error::InvalidArg));
    }

    #[test]
    fn test_overflow() {
        assert_eq!(validate(usize::MAX - 10, 100), Err(Error::InvalidArg));
    }

    #[test]
    fn test_embedded_zero_bytes_survive() {
        let data = [b'a', 0, b'b', 0];
        let view = FfiByteSlice::new(&data);
        assert_eq!(view.len(), 4);
        assert_eq!(view.as_slice(), Ok(&data[..]));
    }

    #[test]
    fn test_string_round_trip() {
        let s = FfiString::new("/data/a.txt");
        assert_eq!(s.as_str(), Ok("/data/a.txt"));
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let bytes = [0xffu8, 0xfe];
        let s = FfiString(FfiByteSlice::new(&bytes));
        assert_eq!(s.as_str(), Err(Error::InvalidArg));
    }

    #[test]
    fn test_buffer_writes_through() {
        let mut storage = [0u8; 4];
        let buffer = FfiBuffer::new(&mut storage);
        assert_eq!(buffer.capacity(), 4);
        let slice = buffer.into_mut_slice().unwrap();
        slice.copy_from_slice(b"abcd");
        assert_eq!(&storage, b"abcd");
    }
}
