//! System Call Table
//!
//! Publishes a [`Context`] to applications as the static [`API`] table.
//!
//! # Design
//! - One runtime at a time, held in a `spin::Mutex`
//! - Every entry point converts its views, locks the runtime and forwards
//!   to the matching `Context` method
//! - With no runtime installed every entry fails with
//!   `Error::Unimplemented`
//!
//! # Security Considerations
//! - Views are validated (null, overflow, UTF-8) before use and are never
//!   kept past the call
//! - Entry points must not be re-entered from inside a `Console` or
//!   `Volume` callback; the runtime lock is not recursive
//! - `free` is an `unsafe` entry: only pointers from `malloc` on the same
//!   runtime may be passed back, once
//! - Entry points are `extern "C"` and cannot unwind. A panic in a
//!   `Context` method, `Console` or `Volume` below them aborts the whole
//!   process, so those layers report failure through `Error` instead

use core::ffi::c_void;

use spin::Mutex;

use crate::ffi::{FfiBuffer, FfiByteSlice, FfiResult, FfiString};
use crate::{dir, file, Api, Error};

use super::context::Context;

/// The installed runtime.
static RUNTIME: Mutex<Option<Context>> = Mutex::new(None);

/// The table handed to applications.
pub static API: Api = Api {
    open: api_open,
    close: api_close,
    write: api_write,
    read: api_read,
    seek_set: api_seek_set,
    seek_cur: api_seek_cur,
    seek_end: api_seek_end,
    rename: api_rename,
    ioctl: api_ioctl,
    opendir: api_opendir,
    closedir: api_closedir,
    readdir: api_readdir,
    stat: api_stat,
    fstat: api_fstat,
    deletefile: api_deletefile,
    deletedir: api_deletedir,
    chdir: api_chdir,
    dchdir: api_dchdir,
    pwd: api_pwd,
    malloc: api_malloc,
    free: api_free,
};

/// Make `ctx` the runtime behind [`API`] and return the table.
///
/// A previously installed runtime is dropped.
pub fn install(ctx: Context) -> &'static Api {
    if RUNTIME.lock().replace(ctx).is_some() {
        log::warn!("[SYSCALL] replaced an installed runtime");
    }
    log::debug!("[SYSCALL] runtime installed");
    &API
}

/// Remove the installed runtime, if any.
pub fn uninstall() -> Option<Context> {
    log::debug!("[SYSCALL] runtime uninstalled");
    RUNTIME.lock().take()
}

/// Run `f` on the installed runtime.
///
/// Returns None if nothing is installed.
pub fn with_runtime<T>(f: impl FnOnce(&mut Context) -> T) -> Option<T> {
    RUNTIME.lock().as_mut().map(f)
}

fn dispatch<T>(f: impl FnOnce(&mut Context) -> Result<T, Error>) -> FfiResult<T> {
    match RUNTIME.lock().as_mut() {
        Some(ctx) => f(ctx).into(),
        None => {
            log::warn!("[SYSCALL] call with no runtime installed");
            FfiResult::Err(Error::Unimplemented)
        }
    }
}

extern "C" fn api_open(path: FfiString<'_>, flags: file::Flags) -> FfiResult<file::Handle> {
    dispatch(|ctx| ctx.open(path.as_str()?, flags))
}

extern "C" fn api_close(fd: file::Handle) -> FfiResult<()> {
    dispatch(|ctx| ctx.close(fd))
}

extern "C" fn api_write(fd: file::Handle, buffer: FfiByteSlice<'_>) -> FfiResult<()> {
    dispatch(|ctx| ctx.write(fd, buffer.as_slice()?))
}

extern "C" fn api_read(fd: file::Handle, buffer: FfiBuffer<'_>) -> FfiResult<usize> {
    dispatch(|ctx| ctx.read(fd, buffer.into_mut_slice()?))
}

extern "C" fn api_seek_set(fd: file::Handle, position: u64) -> FfiResult<()> {
    dispatch(|ctx| ctx.seek_set(fd, position))
}

extern "C" fn api_seek_cur(fd: file::Handle, offset: i64) -> FfiResult<u64> {
    dispatch(|ctx| ctx.seek_cur(fd, offset))
}

extern "C" fn api_seek_end(fd: file::Handle) -> FfiResult<u64> {
    dispatch(|ctx| ctx.seek_end(fd))
}

extern "C" fn api_rename(old_path: FfiString<'_>, new_path: FfiString<'_>) -> FfiResult<()> {
    dispatch(|ctx| ctx.rename(old_path.as_str()?, new_path.as_str()?))
}

extern "C" fn api_ioctl(fd: file::Handle, command: u64, value: u64) -> FfiResult<u64> {
    dispatch(|ctx| ctx.ioctl(fd, command, value))
}

extern "C" fn api_opendir(path: FfiString<'_>) -> FfiResult<dir::Handle> {
    dispatch(|ctx| ctx.opendir(path.as_str()?))
}

extern "C" fn api_closedir(dir: dir::Handle) -> FfiResult<()> {
    dispatch(|ctx| ctx.closedir(dir))
}

extern "C" fn api_readdir(dir: dir::Handle) -> FfiResult<dir::Entry> {
    dispatch(|ctx| ctx.readdir(dir))
}

extern "C" fn api_stat(path: FfiString<'_>) -> FfiResult<file::Stat> {
    dispatch(|ctx| ctx.stat(path.as_str()?))
}

extern "C" fn api_fstat(fd: file::Handle) -> FfiResult<file::Stat> {
    dispatch(|ctx| ctx.fstat(fd))
}

extern "C" fn api_deletefile(path: FfiString<'_>) -> FfiResult<()> {
    dispatch(|ctx| ctx.deletefile(path.as_str()?))
}

extern "C" fn api_deletedir(path: FfiString<'_>) -> FfiResult<()> {
    dispatch(|ctx| ctx.deletedir(path.as_str()?))
}

extern "C" fn api_chdir(path: FfiString<'_>) -> FfiResult<()> {
    dispatch(|ctx| ctx.chdir(path.as_str()?))
}

extern "C" fn api_dchdir(dir: dir::Handle) -> FfiResult<()> {
    dispatch(|ctx| ctx.dchdir(dir))
}

extern "C" fn api_pwd(path: FfiBuffer<'_>) -> FfiResult<usize> {
    dispatch(|ctx| ctx.pwd(path.into_mut_slice()?))
}

extern "C" fn api_malloc(size: usize, alignment: usize) -> FfiResult<*mut c_void> {
    dispatch(|ctx| ctx.malloc(size, alignment))
}

/// # Safety
/// `ptr`, `size` and `alignment` must match a live allocation from
/// `api_malloc` on the installed runtime.
unsafe extern "C" fn api_free(ptr: *mut c_void, size: usize, alignment: usize) {
    if let Some(ctx) = RUNTIME.lock().as_mut() {
        // SAFETY: Our caller passes back a live allocation from this runtime.
        unsafe { ctx.free(ptr, size, alignment) }
    }
}

/// Serialises tests that install a runtime.
#[cfg(test)]
pub(crate) fn test_lock() -> spin::MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock()
}
