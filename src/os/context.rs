//! Runtime Context
//!
//! Everything the OS keeps on behalf of applications: open handles,
//! mounted volumes, the current directory, the heap and the console.
//!
//! Each table operation is a method here. Nothing is global, so tests can
//! build as many independent contexts as they like; [`super::syscall`]
//! installs one of them behind the static [`crate::Api`].
//!
//! # Security Considerations
//! - Handles are checked for range and kind on every call
//! - Paths are resolved and validated before any volume sees them
//! - A file is never open twice, and nothing open can be renamed or deleted

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::ffi::c_void;

use crate::dir::{self, Entry};
use crate::file::{self, Attributes, Flags, Stat, Time};
use crate::path::{Path, DRIVE_SEP, PATH_SEP};
use crate::Error;

use super::console::{Console, NullConsole};
use super::handles::{HandleTable, Object, OpenDir, OpenFile, Slot};
use super::heap::AppHeap;
use super::location::Location;
use super::volume::Volume;

/// A volume and the drive name it is mounted under.
struct Mount {
    name: String,
    volume: Box<dyn Volume>,
}

fn volume(mounts: &[Mount], index: usize) -> Result<&dyn Volume, Error> {
    let mount = mounts.get(index).ok_or(Error::NotFound)?;
    Ok(mount.volume.as_ref())
}

fn volume_mut(mounts: &mut [Mount], index: usize) -> Result<&mut dyn Volume, Error> {
    let mount = mounts.get_mut(index).ok_or(Error::NotFound)?;
    let volume: &mut dyn Volume = mount.volume.as_mut();
    Ok(volume)
}

fn epoch() -> Time {
    Time::EPOCH
}

/// The state behind one operation table.
pub struct Context {
    handles: HandleTable,
    mounts: Vec<Mount>,
    cwd: Location,
    heap: AppHeap,
    console: Box<dyn Console>,
    clock: fn() -> Time,
}

impl Context {
    /// A context with no volumes, no heap and a [`NullConsole`].
    ///
    /// Handles 0, 1 and 2 are already open on the console.
    pub fn new() -> Self {
        let mut handles = HandleTable::new();
        for slot in [Slot::STDIN, Slot::STDOUT, Slot::STDERR] {
            // A fresh table has every slot free
            let _ = handles.insert(slot, Object::Console);
        }
        Self {
            handles,
            mounts: Vec::new(),
            cwd: Location::root(0),
            heap: AppHeap::empty(),
            console: Box::new(NullConsole),
            clock: epoch,
        }
    }

    /// Serve `malloc` from `arena`.
    pub fn with_heap(mut self, arena: &'static mut [u8]) -> Self {
        self.heap = AppHeap::new(arena);
        self
    }

    /// Use `console` for handles 0..=2.
    pub fn with_console(mut self, console: impl Console + 'static) -> Self {
        self.console = Box::new(console);
        self
    }

    /// Use `clock` to timestamp files.
    pub fn with_clock(mut self, clock: fn() -> Time) -> Self {
        self.clock = clock;
        self
    }

    /// Mount a volume under a drive name.
    ///
    /// The first volume mounted is the default one, and holds the initial
    /// current directory. Returns the volume index.
    pub fn mount(&mut self, name: &str, volume: impl Volume + 'static) -> Result<usize, Error> {
        if name.is_empty() || name.contains(PATH_SEP) || name.contains(DRIVE_SEP) {
            return Err(Error::InvalidArg);
        }
        if self.find_volume(name).is_some() {
            return Err(Error::InvalidArg);
        }
        self.mounts.push(Mount {
            name: name.to_string(),
            volume: Box::new(volume),
        });
        log::debug!("mounted {} as volume {}", name, self.mounts.len() - 1);
        Ok(self.mounts.len() - 1)
    }

    /// The current directory.
    pub fn cwd(&self) -> &Location {
        &self.cwd
    }

    /// The application heap.
    pub fn heap(&self) -> &AppHeap {
        &self.heap
    }

    /// The handle table.
    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// Create a directory. Used by the OS to lay out volumes; not part of
    /// the table.
    pub fn mkdir(&mut self, path: &str) -> Result<(), Error> {
        let location = self.resolve(path)?;
        let now = self.now();
        volume_mut(&mut self.mounts, location.volume)?.create_dir(&location.path, now)
    }

    fn now(&self) -> Time {
        (self.clock)()
    }

    fn find_volume(&self, drive: &str) -> Option<usize> {
        self.mounts
            .iter()
            .position(|mount| mount.name.eq_ignore_ascii_case(drive))
    }

    fn resolve(&self, path: &str) -> Result<Location, Error> {
        let path = Path::new(path)?;
        Location::resolve(&path, &self.cwd, |drive| self.find_volume(drive))
    }

    /// Resolve a path that must not be a volume root.
    fn resolve_entry(&self, path: &str) -> Result<Location, Error> {
        let location = self.resolve(path)?;
        if location.is_root() {
            return Err(Error::InvalidPath);
        }
        Ok(location)
    }

    // File operations

    /// Open a file.
    ///
    /// # Errors
    /// - `NotFound`: no such file and `CREATE` not given, or missing parent
    /// - `InvalidPath`: bad path, or it names a directory
    /// - `InvalidArg`: already open, or `TRUNCATE` without `WRITE`
    /// - `FileReadOnly`: `WRITE` on a read-only file
    /// - `OutOfMemory`: no free handles
    pub fn open(&mut self, path: &str, flags: Flags) -> Result<file::Handle, Error> {
        log::debug!("open({:?}, {:?})", path, flags);
        if flags.contains(Flags::TRUNCATE) && !flags.contains(Flags::WRITE) {
            return Err(Error::InvalidArg);
        }

        let location = self.resolve_entry(path)?;
        if self.handles.is_file_open(&location) {
            log::warn!("open: {} is already open", path);
            return Err(Error::InvalidArg);
        }
        if self.handles.find_free(Slot::FIRST_USER).is_none() {
            log::warn!("open: handle table full");
            return Err(Error::OutOfMemory);
        }

        let now = self.now();
        let volume = volume_mut(&mut self.mounts, location.volume)?;
        match volume.stat(&location.path) {
            Ok(stat) if stat.is_dir() => return Err(Error::InvalidPath),
            Ok(stat) => {
                if flags.contains(Flags::WRITE) && stat.attr.contains(Attributes::READ_ONLY) {
                    return Err(Error::FileReadOnly);
                }
            }
            Err(Error::NotFound) if flags.contains(Flags::CREATE) => {
                volume.create_file(&location.path, now)?;
            }
            Err(e) => return Err(e),
        }
        if flags.contains(Flags::TRUNCATE) {
            volume.set_len(&location.path, 0)?;
        }

        let slot = self.handles.allocate(Object::File(OpenFile {
            location,
            position: 0,
            flags,
        }))?;
        Ok(file::Handle::new(slot.value()))
    }

    /// Close a file handle, syncing its directory entry.
    pub fn close(&mut self, fd: file::Handle) -> Result<(), Error> {
        log::debug!("close({})", fd.value());
        if let Object::Dir(_) = self.handles.get(fd.value())? {
            return Err(Error::BadHandle);
        }
        if let Object::File(file) = self.handles.remove(fd.value())? {
            let now = self.now();
            volume_mut(&mut self.mounts, file.location.volume)?.sync(&file.location.path, now)?;
        }
        Ok(())
    }

    /// Write all of `data` at the file position.
    pub fn write(&mut self, fd: file::Handle, data: &[u8]) -> Result<(), Error> {
        log::trace!("write({}, {} bytes)", fd.value(), data.len());
        match self.handles.get_mut(fd.value())? {
            Object::Console => self.console.write(data),
            Object::File(file) => {
                if !file.flags.contains(Flags::WRITE) {
                    return Err(Error::FileReadOnly);
                }
                let volume = volume_mut(&mut self.mounts, file.location.volume)?;
                if file.flags.contains(Flags::APPEND) {
                    file.position = volume.stat(&file.location.path)?.file_size;
                }
                volume.write_at(&file.location.path, file.position, data)?;
                file.position += data.len() as u64;
                Ok(())
            }
            Object::Dir(_) | Object::Empty => Err(Error::BadHandle),
        }
    }

    /// Read into `buffer` from the file position.
    ///
    /// A short read is success. Reading at end of file is
    /// `Error::EndOfFile`.
    pub fn read(&mut self, fd: file::Handle, buffer: &mut [u8]) -> Result<usize, Error> {
        log::trace!("read({}, {} bytes)", fd.value(), buffer.len());
        match self.handles.get_mut(fd.value())? {
            Object::Console => self.console.read(buffer),
            Object::File(file) => {
                let volume = volume(&self.mounts, file.location.volume)?;
                if file.position >= volume.stat(&file.location.path)?.file_size {
                    return Err(Error::EndOfFile);
                }
                let count = volume.read_at(&file.location.path, file.position, buffer)?;
                file.position += count as u64;
                Ok(count)
            }
            Object::Dir(_) | Object::Empty => Err(Error::BadHandle),
        }
    }

    fn seekable(&mut self, fd: file::Handle) -> Result<&mut OpenFile, Error> {
        match self.handles.get_mut(fd.value())? {
            Object::File(file) => Ok(file),
            Object::Console => Err(Error::DeviceSpecific),
            Object::Dir(_) | Object::Empty => Err(Error::BadHandle),
        }
    }

    /// Move to an absolute position. Past the end is allowed.
    pub fn seek_set(&mut self, fd: file::Handle, position: u64) -> Result<(), Error> {
        log::trace!("seek_set({}, {})", fd.value(), position);
        self.seekable(fd)?.position = position;
        Ok(())
    }

    /// Move relative to the current position.
    pub fn seek_cur(&mut self, fd: file::Handle, offset: i64) -> Result<u64, Error> {
        log::trace!("seek_cur({}, {})", fd.value(), offset);
        let file = self.seekable(fd)?;
        file.position = file
            .position
            .checked_add_signed(offset)
            .ok_or(Error::InvalidArg)?;
        Ok(file.position)
    }

    /// Move to the end of the file.
    pub fn seek_end(&mut self, fd: file::Handle) -> Result<u64, Error> {
        log::trace!("seek_end({})", fd.value());
        let file = match self.handles.get_mut(fd.value())? {
            Object::File(file) => file,
            Object::Console => return Err(Error::DeviceSpecific),
            Object::Dir(_) | Object::Empty => return Err(Error::BadHandle),
        };
        file.position = volume(&self.mounts, file.location.volume)?
            .stat(&file.location.path)?
            .file_size;
        Ok(file.position)
    }

    /// Move a file or directory within one volume.
    pub fn rename(&mut self, old_path: &str, new_path: &str) -> Result<(), Error> {
        log::debug!("rename({:?}, {:?})", old_path, new_path);
        let from = self.resolve_entry(old_path)?;
        let to = self.resolve_entry(new_path)?;
        if from.volume != to.volume {
            return Err(Error::InvalidPath);
        }
        if self.handles.any_within(&from) || self.handles.any_within(&to) {
            log::warn!("rename: {} or {} is open", old_path, new_path);
            return Err(Error::InvalidArg);
        }
        if self.cwd.starts_with(&from) {
            return Err(Error::InvalidArg);
        }
        volume_mut(&mut self.mounts, from.volume)?.rename(&from.path, &to.path)
    }

    /// Device-specific control. Only the console answers.
    pub fn ioctl(&mut self, fd: file::Handle, command: u64, value: u64) -> Result<u64, Error> {
        log::debug!("ioctl({}, {:#x}, {:#x})", fd.value(), command, value);
        match self.handles.get(fd.value())? {
            Object::Console => self.console.ioctl(command, value),
            Object::File(_) => Err(Error::Unimplemented),
            Object::Dir(_) | Object::Empty => Err(Error::BadHandle),
        }
    }

    // Directory operations

    /// Open a directory for reading.
    pub fn opendir(&mut self, path: &str) -> Result<dir::Handle, Error> {
        log::debug!("opendir({:?})", path);
        let location = self.resolve(path)?;
        if !volume(&self.mounts, location.volume)?
            .stat(&location.path)?
            .is_dir()
        {
            return Err(Error::InvalidPath);
        }
        let slot = self.handles.allocate(Object::Dir(OpenDir {
            location,
            cursor: 0,
            exhausted: false,
        }))?;
        Ok(dir::Handle::new(slot.value()))
    }

    /// Close a directory handle.
    pub fn closedir(&mut self, dir: dir::Handle) -> Result<(), Error> {
        log::debug!("closedir({})", dir.value());
        self.handles.dir_mut(dir.value())?;
        self.handles.remove(dir.value())?;
        Ok(())
    }

    /// The next entry of an open directory.
    ///
    /// Entries deleted or renamed in place during the listing never make
    /// it skip or repeat the others. Once the end is reached every later
    /// call is `Error::EndOfFile`.
    pub fn readdir(&mut self, dir: dir::Handle) -> Result<Entry, Error> {
        log::trace!("readdir({})", dir.value());
        let open = self.handles.dir_mut(dir.value())?;
        if open.exhausted {
            return Err(Error::EndOfFile);
        }
        match volume(&self.mounts, open.location.volume)?.entry(&open.location.path, open.cursor) {
            Ok((entry, next)) => {
                open.cursor = next;
                Ok(entry)
            }
            Err(Error::EndOfFile) => {
                open.exhausted = true;
                Err(Error::EndOfFile)
            }
            Err(e) => Err(e),
        }
    }

    /// Metadata for a path.
    pub fn stat(&self, path: &str) -> Result<Stat, Error> {
        log::debug!("stat({:?})", path);
        let location = self.resolve(path)?;
        volume(&self.mounts, location.volume)?.stat(&location.path)
    }

    /// Metadata for an open file.
    pub fn fstat(&self, fd: file::Handle) -> Result<Stat, Error> {
        log::debug!("fstat({})", fd.value());
        match self.handles.get(fd.value())? {
            Object::File(file) => volume(&self.mounts, file.location.volume)?.stat(&file.location.path),
            Object::Console => Err(Error::Unimplemented),
            Object::Dir(_) | Object::Empty => Err(Error::BadHandle),
        }
    }

    /// Delete a file that isn't open.
    pub fn deletefile(&mut self, path: &str) -> Result<(), Error> {
        log::debug!("deletefile({:?})", path);
        let location = self.resolve_entry(path)?;
        if self.handles.is_file_open(&location) {
            log::warn!("deletefile: {} is open", path);
            return Err(Error::InvalidArg);
        }
        let volume = volume_mut(&mut self.mounts, location.volume)?;
        let stat = volume.stat(&location.path)?;
        if stat.is_dir() {
            return Err(Error::InvalidPath);
        }
        if stat.attr.contains(Attributes::READ_ONLY) {
            return Err(Error::FileReadOnly);
        }
        volume.remove_file(&location.path)
    }

    /// Delete an empty directory. Never recursive.
    pub fn deletedir(&mut self, path: &str) -> Result<(), Error> {
        log::debug!("deletedir({:?})", path);
        let location = self.resolve_entry(path)?;
        if self.handles.any_within(&location) || self.cwd.starts_with(&location) {
            log::warn!("deletedir: {} is in use", path);
            return Err(Error::InvalidArg);
        }
        volume_mut(&mut self.mounts, location.volume)?.remove_dir(&location.path)
    }

    /// Change the current directory.
    pub fn chdir(&mut self, path: &str) -> Result<(), Error> {
        log::debug!("chdir({:?})", path);
        let location = self.resolve(path)?;
        if !volume(&self.mounts, location.volume)?
            .stat(&location.path)?
            .is_dir()
        {
            return Err(Error::InvalidPath);
        }
        self.cwd = location;
        Ok(())
    }

    /// Change the current directory to an open directory.
    pub fn dchdir(&mut self, dir: dir::Handle) -> Result<(), Error> {
        log::debug!("dchdir({})", dir.value());
        self.cwd = self.handles.dir_mut(dir.value())?.location.clone();
        Ok(())
    }

    /// Write the current directory into `buffer`, returning its length.
    ///
    /// The default volume has no drive prefix (`/DATA`); others do
    /// (`SD:/DATA`). Fails with `Error::InvalidArg` if `buffer` is too
    /// small, without touching it.
    pub fn pwd(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        let drive = match self.cwd.volume {
            0 => None,
            index => self.mounts.get(index).map(|mount| mount.name.as_str()),
        };
        let text = self.cwd.display(drive).to_string();
        log::debug!("pwd() = {:?}", text);
        let dest = buffer.get_mut(..text.len()).ok_or(Error::InvalidArg)?;
        dest.copy_from_slice(text.as_bytes());
        Ok(text.len())
    }

    // Memory

    /// Allocate from the application heap.
    pub fn malloc(&mut self, size: usize, alignment: usize) -> Result<*mut c_void, Error> {
        log::trace!("malloc({}, {})", size, alignment);
        Ok(self.heap.malloc(size, alignment)?.as_ptr().cast())
    }

    /// Free memory from [`Context::malloc`].
    ///
    /// # Safety
    /// `ptr`, `size` and `alignment` must match an earlier `malloc` on this
    /// context that has not been freed.
    pub unsafe fn free(&mut self, ptr: *mut c_void, size: usize, alignment: usize) {
        log::trace!("free({:p}, {}, {})", ptr, size, alignment);
        // SAFETY: Forwarded from the caller's contract.
        unsafe { self.heap.free(ptr.cast(), size, alignment) }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Context {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names: Vec<&str> = self.mounts.iter().map(|m| m.name.as_str()).collect();
        f.debug_struct("Context")
            .field("volumes", &names)
            .field("cwd", &self.cwd)
            .field("open_handles", &self.handles.count())
            .field("heap", &self.heap)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::console::MemoryConsole;
    use crate::os::ramdisk::RamVolume;
    use std::boxed::Box;
    use std::vec;
    use std::vec::Vec;

    fn context() -> Context {
        let mut ctx = Context::new();
        ctx.mount("SD", RamVolume::new()).unwrap();
        ctx
    }

    fn write_file(ctx: &mut Context, path: &str, data: &[u8]) {
        let fd = ctx.open(path, Flags::WRITE | Flags::CREATE).unwrap();
        ctx.write(fd, data).unwrap();
        ctx.close(fd).unwrap();
    }

    #[test]
    fn test_hello_world_round_trip() {
        let mut ctx = context();
        let fd = ctx.open("/a.txt", Flags::WRITE | Flags::CREATE).unwrap();
        ctx.write(fd, b"Hello, world").unwrap();
        ctx.close(fd).unwrap();

        let fd = ctx.open("/a.txt", Flags::empty()).unwrap();
        let mut buf = [0u8; 1024];
        assert_eq!(ctx.read(fd, &mut buf), Ok(12));
        assert_eq!(&buf[..12], b"Hello, world");
        ctx.close(fd).unwrap();
    }

    #[test]
    fn test_embedded_zeros_round_trip() {
        let mut ctx = context();
        let data: Vec<u8> = (0..=255u8).chain([0, 0, 0]).collect();
        let fd = ctx.open("blob.bin", Flags::WRITE | Flags::CREATE).unwrap();
        ctx.write(fd, &data).unwrap();
        ctx.seek_set(fd, 0).unwrap();
        let mut buf = vec![0xaau8; data.len()];
        assert_eq!(ctx.read(fd, &mut buf), Ok(data.len()));
        assert_eq!(buf, data);
    }

    #[test]
    fn test_read_at_end_is_eof() {
        let mut ctx = context();
        write_file(&mut ctx, "a.txt", b"abc");
        let fd = ctx.open("a.txt", Flags::empty()).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(ctx.read(fd, &mut buf), Ok(2));
        assert_eq!(ctx.read(fd, &mut buf), Ok(1));
        assert_eq!(ctx.read(fd, &mut buf), Err(Error::EndOfFile));
        assert_eq!(ctx.read(fd, &mut [0u8; 0]), Err(Error::EndOfFile));

        let empty = ctx.open("e.txt", Flags::WRITE | Flags::CREATE).unwrap();
        assert_eq!(ctx.read(empty, &mut buf), Err(Error::EndOfFile));
    }

    #[test]
    fn test_open_rules() {
        let mut ctx = context();
        assert_eq!(ctx.open("a.txt", Flags::empty()), Err(Error::NotFound));
        assert_eq!(ctx.open("a.txt", Flags::TRUNCATE), Err(Error::InvalidArg));
        assert_eq!(ctx.open("/", Flags::empty()), Err(Error::InvalidPath));
        assert_eq!(ctx.open("toolongname.txt", Flags::CREATE), Err(Error::InvalidPath));

        let fd = ctx.open("a.txt", Flags::CREATE).unwrap();
        assert_eq!(ctx.open("/A.TXT", Flags::empty()), Err(Error::InvalidArg));
        ctx.close(fd).unwrap();
        assert!(ctx.open("a.txt", Flags::empty()).is_ok());

        ctx.mkdir("sub").unwrap();
        assert_eq!(ctx.open("sub", Flags::empty()), Err(Error::InvalidPath));
    }

    #[test]
    fn test_handle_exhaustion() {
        let mut ctx = context();
        ctx.mkdir("d").unwrap();
        for _ in Slot::FIRST_USER.index()..crate::os::MAX_HANDLES {
            ctx.opendir("d").unwrap();
        }
        assert_eq!(ctx.opendir("d"), Err(Error::OutOfMemory));
        assert_eq!(ctx.open("new.txt", Flags::CREATE), Err(Error::OutOfMemory));
        assert_eq!(ctx.stat("new.txt"), Err(Error::NotFound));
    }

    #[test]
    fn test_close_twice() {
        let mut ctx = context();
        let fd = ctx.open("a.txt", Flags::CREATE).unwrap();
        ctx.close(fd).unwrap();
        assert_eq!(ctx.close(fd), Err(Error::BadHandle));
        assert_eq!(ctx.close(file::Handle::new(200)), Err(Error::BadHandle));
    }

    #[test]
    fn test_write_needs_write_flag() {
        let mut ctx = context();
        let fd = ctx.open("a.txt", Flags::CREATE).unwrap();
        assert_eq!(ctx.write(fd, b"x"), Err(Error::FileReadOnly));
    }

    #[test]
    fn test_read_only_attribute() {
        let mut vol = RamVolume::new();
        let name = [dir::ShortName::parse("lock.txt").unwrap()];
        vol.create_file(&name, Time::EPOCH).unwrap();
        vol.set_attributes(&name, Attributes::READ_ONLY).unwrap();
        let mut ctx = Context::new();
        ctx.mount("SD", vol).unwrap();

        assert_eq!(ctx.open("lock.txt", Flags::WRITE), Err(Error::FileReadOnly));
        assert_eq!(ctx.deletefile("lock.txt"), Err(Error::FileReadOnly));
        let fd = ctx.open("lock.txt", Flags::empty()).unwrap();
        ctx.close(fd).unwrap();
    }

    #[test]
    fn test_append_and_truncate() {
        let mut ctx = context();
        write_file(&mut ctx, "log.txt", b"one");

        let fd = ctx.open("log.txt", Flags::WRITE | Flags::APPEND).unwrap();
        ctx.seek_set(fd, 0).unwrap();
        ctx.write(fd, b"two").unwrap();
        assert_eq!(ctx.fstat(fd).unwrap().file_size, 6);
        ctx.close(fd).unwrap();

        let fd = ctx.open("log.txt", Flags::WRITE | Flags::TRUNCATE).unwrap();
        assert_eq!(ctx.fstat(fd).unwrap().file_size, 0);
    }

    #[test]
    fn test_seek() {
        let mut ctx = context();
        write_file(&mut ctx, "a.txt", b"0123456789");
        let fd = ctx.open("a.txt", Flags::WRITE).unwrap();

        assert_eq!(ctx.seek_end(fd), Ok(10));
        assert_eq!(ctx.seek_cur(fd, -4), Ok(6));
        let mut buf = [0u8; 2];
        ctx.read(fd, &mut buf).unwrap();
        assert_eq!(&buf, b"67");
        assert_eq!(ctx.seek_cur(fd, -100), Err(Error::InvalidArg));
        assert_eq!(ctx.seek_cur(fd, 0), Ok(8));

        // Writing past the end fills the gap with zeros
        ctx.seek_set(fd, 12).unwrap();
        ctx.write(fd, b"!").unwrap();
        ctx.seek_set(fd, 9).unwrap();
        let mut tail = [0xffu8; 4];
        assert_eq!(ctx.read(fd, &mut tail), Ok(4));
        assert_eq!(&tail, b"9\0\0!");
    }

    #[test]
    fn test_console_handles() {
        let console = MemoryConsole::new();
        let mut ctx = context().with_console(console.clone());
        let stdout = file::Handle::new_stdout();
        let stdin = file::Handle::new_stdin();

        ctx.write(stdout, b"Hello").unwrap();
        ctx.write(file::Handle::new_stderr(), b"!").unwrap();
        assert_eq!(console.take_output(), b"Hello!");

        console.push_input(b"hi");
        let mut buf = [0u8; 8];
        assert_eq!(ctx.read(stdin, &mut buf), Ok(2));

        assert_eq!(ctx.seek_set(stdout, 0), Err(Error::DeviceSpecific));
        assert_eq!(ctx.seek_end(stdout), Err(Error::DeviceSpecific));
        assert_eq!(ctx.fstat(stdout), Err(Error::Unimplemented));
        assert_eq!(ctx.ioctl(stdin, crate::os::console::IOCTL_INPUT_PENDING, 0), Ok(0));
    }

    #[test]
    fn test_ioctl_on_file() {
        let mut ctx = context();
        let fd = ctx.open("a.txt", Flags::CREATE).unwrap();
        assert_eq!(ctx.ioctl(fd, 0, 0), Err(Error::Unimplemented));
    }

    #[test]
    fn test_readdir_n_plus_one() {
        let mut ctx = context();
        ctx.mkdir("data").unwrap();
        write_file(&mut ctx, "data/a.txt", b"a");
        write_file(&mut ctx, "data/b.txt", b"bb");
        ctx.mkdir("data/sub").unwrap();

        let dh = ctx.opendir("data").unwrap();
        let mut names = Vec::new();
        for _ in 0..3 {
            names.push(ctx.readdir(dh).unwrap().short_name().to_string());
        }
        assert_eq!(names, ["A.TXT", "B.TXT", "SUB"]);
        assert_eq!(ctx.readdir(dh), Err(Error::EndOfFile));
        assert_eq!(ctx.readdir(dh), Err(Error::EndOfFile));

        // Adding an entry later does not rewind a finished listing
        write_file(&mut ctx, "data/c.txt", b"");
        assert_eq!(ctx.readdir(dh), Err(Error::EndOfFile));
        ctx.closedir(dh).unwrap();
    }

    #[test]
    fn test_readdir_while_deleting() {
        let mut ctx = context();
        ctx.mkdir("d").unwrap();
        for name in ["d/a.txt", "d/b.txt", "d/c.txt"] {
            write_file(&mut ctx, name, b"x");
        }

        let dh = ctx.opendir("d").unwrap();
        assert_eq!(ctx.readdir(dh).unwrap().short_name().to_string(), "A.TXT");
        ctx.deletefile("d/a.txt").unwrap();
        assert_eq!(ctx.readdir(dh).unwrap().short_name().to_string(), "B.TXT");
        assert_eq!(ctx.readdir(dh).unwrap().short_name().to_string(), "C.TXT");
        assert_eq!(ctx.readdir(dh), Err(Error::EndOfFile));
        ctx.closedir(dh).unwrap();
    }

    #[test]
    fn test_readdir_while_renaming() {
        let mut ctx = context();
        ctx.mkdir("d").unwrap();
        ctx.mkdir("other").unwrap();
        for name in ["d/a.txt", "d/b.txt", "d/c.txt", "d/e.txt"] {
            write_file(&mut ctx, name, b"x");
        }

        let dh = ctx.opendir("d").unwrap();
        let mut names = vec![ctx.readdir(dh).unwrap().short_name().to_string()];
        // Renaming a listed entry in place does not bring it back
        ctx.rename("d/a.txt", "d/z.txt").unwrap();
        names.push(ctx.readdir(dh).unwrap().short_name().to_string());
        // An unlisted entry renamed in place is seen under its new name
        ctx.rename("d/c.txt", "d/y.txt").unwrap();
        // An unlisted entry moved away is not seen
        ctx.rename("d/e.txt", "other/e.txt").unwrap();
        while let Ok(entry) = ctx.readdir(dh) {
            names.push(entry.short_name().to_string());
        }
        assert_eq!(names, ["A.TXT", "B.TXT", "Y.TXT"]);
        ctx.closedir(dh).unwrap();
    }

    #[test]
    fn test_handle_kinds_do_not_mix() {
        let mut ctx = context();
        let dh = ctx.opendir("/").unwrap();
        let as_file = file::Handle::new(dh.value());
        assert_eq!(ctx.read(as_file, &mut [0u8; 4]), Err(Error::BadHandle));
        assert_eq!(ctx.close(as_file), Err(Error::BadHandle));

        let fd = ctx.open("a.txt", Flags::CREATE).unwrap();
        let as_dir = dir::Handle::new(fd.value());
        assert_eq!(ctx.readdir(as_dir), Err(Error::BadHandle));
        assert_eq!(ctx.closedir(as_dir), Err(Error::BadHandle));
        assert_eq!(ctx.dchdir(as_dir), Err(Error::BadHandle));
    }

    #[test]
    fn test_opendir_of_file() {
        let mut ctx = context();
        write_file(&mut ctx, "a.txt", b"");
        assert_eq!(ctx.opendir("a.txt"), Err(Error::InvalidPath));
        assert_eq!(ctx.chdir("a.txt"), Err(Error::InvalidPath));
        assert_eq!(ctx.opendir("missing"), Err(Error::NotFound));
    }

    #[test]
    fn test_deletedir_non_empty() {
        let mut ctx = context();
        ctx.mkdir("data").unwrap();
        write_file(&mut ctx, "data/keep.txt", b"keep");

        assert_eq!(ctx.deletedir("data"), Err(Error::InvalidArg));
        assert_eq!(ctx.stat("data/keep.txt").unwrap().file_size, 4);
        assert_eq!(ctx.deletedir("/"), Err(Error::InvalidPath));

        ctx.deletefile("data/keep.txt").unwrap();
        ctx.deletedir("data").unwrap();
        assert_eq!(ctx.stat("data"), Err(Error::NotFound));
    }

    #[test]
    fn test_delete_open_or_current() {
        let mut ctx = context();
        ctx.mkdir("data").unwrap();
        let fd = ctx.open("data/a.txt", Flags::CREATE).unwrap();
        assert_eq!(ctx.deletefile("data/a.txt"), Err(Error::InvalidArg));
        assert_eq!(ctx.deletefile("data"), Err(Error::InvalidPath));
        ctx.close(fd).unwrap();
        ctx.deletefile("data/a.txt").unwrap();

        ctx.chdir("data").unwrap();
        assert_eq!(ctx.deletedir("/data"), Err(Error::InvalidArg));
        ctx.chdir("..").unwrap();
        ctx.deletedir("data").unwrap();
    }

    #[test]
    fn test_rename() {
        let mut ctx = context();
        ctx.mount("USB", RamVolume::new()).unwrap();
        write_file(&mut ctx, "a.txt", b"abc");

        let fd = ctx.open("a.txt", Flags::empty()).unwrap();
        assert_eq!(ctx.rename("a.txt", "b.txt"), Err(Error::InvalidArg));
        ctx.close(fd).unwrap();

        assert_eq!(ctx.rename("a.txt", "USB:/a.txt"), Err(Error::InvalidPath));
        ctx.rename("a.txt", "b.txt").unwrap();
        assert_eq!(ctx.stat("a.txt"), Err(Error::NotFound));
        assert_eq!(ctx.stat("b.txt").unwrap().file_size, 3);

        write_file(&mut ctx, "c.txt", b"");
        assert_eq!(ctx.rename("c.txt", "b.txt"), Err(Error::InvalidArg));
    }

    #[test]
    fn test_pwd_too_small() {
        let mut ctx = context();
        ctx.mkdir("data").unwrap();
        ctx.chdir("/data").unwrap();

        let mut small = [b'x'; 4];
        assert_eq!(ctx.pwd(&mut small), Err(Error::InvalidArg));
        assert_eq!(&small, b"xxxx");

        let mut buf = [0u8; 5];
        assert_eq!(ctx.pwd(&mut buf), Ok(5));
        assert_eq!(&buf, b"/DATA");
    }

    #[test]
    fn test_chdir_pwd_identity() {
        let mut ctx = context();
        ctx.mount("USB", RamVolume::new()).unwrap();
        ctx.mkdir("USB:/docs").unwrap();
        ctx.chdir("usb:docs").unwrap();

        let mut buf = [0u8; 64];
        let len = ctx.pwd(&mut buf).unwrap();
        let text = core::str::from_utf8(&buf[..len]).unwrap().to_string();
        assert_eq!(text, "USB:/DOCS");

        ctx.chdir("SD:/").unwrap();
        ctx.chdir(&text).unwrap();
        assert_eq!(ctx.cwd().volume, 1);

        // One current directory for every drive
        write_file(&mut ctx, "note.txt", b"n");
        assert!(ctx.stat("USB:/docs/note.txt").is_ok());
        assert_eq!(ctx.stat("SD:/note.txt"), Err(Error::NotFound));
    }

    #[test]
    fn test_dchdir() {
        let mut ctx = context();
        ctx.mkdir("data").unwrap();
        let dh = ctx.opendir("data").unwrap();
        ctx.dchdir(dh).unwrap();
        ctx.closedir(dh).unwrap();
        write_file(&mut ctx, "x.txt", b"");
        assert!(ctx.stat("/data/x.txt").is_ok());
    }

    #[test]
    fn test_timestamps() {
        fn later() -> Time {
            Time {
                year_since_1970: 55,
                ..Time::EPOCH
            }
        }
        let mut ctx = context();
        let fd = ctx.open("a.txt", Flags::CREATE | Flags::WRITE).unwrap();
        ctx.close(fd).unwrap();

        let mut ctx = ctx.with_clock(later);
        let fd = ctx.open("a.txt", Flags::WRITE).unwrap();
        ctx.close(fd).unwrap();
        let stat = ctx.stat("a.txt").unwrap();
        assert_eq!(stat.ctime, Time::EPOCH);
        assert_eq!(stat.mtime.year(), 2025);
    }

    #[test]
    fn test_volume_full() {
        let mut ctx = Context::new();
        ctx.mount("SD", RamVolume::with_capacity(4)).unwrap();
        let fd = ctx.open("a.bin", Flags::CREATE | Flags::WRITE).unwrap();
        ctx.write(fd, b"1234").unwrap();
        assert_eq!(ctx.write(fd, b"5"), Err(Error::DeviceSpecific));
        assert_eq!(ctx.fstat(fd).unwrap().file_size, 4);
    }

    #[test]
    fn test_mount_names() {
        let mut ctx = context();
        assert_eq!(ctx.mount("sd", RamVolume::new()), Err(Error::InvalidArg));
        assert_eq!(ctx.mount("", RamVolume::new()), Err(Error::InvalidArg));
        assert_eq!(ctx.mount("A:B", RamVolume::new()), Err(Error::InvalidArg));
        assert_eq!(ctx.stat("NOPE:/"), Err(Error::NotFound));
    }

    #[test]
    fn test_nothing_mounted() {
        let mut ctx = Context::new();
        assert_eq!(ctx.open("a.txt", Flags::CREATE), Err(Error::NotFound));
        let mut buf = [0u8; 4];
        assert_eq!(ctx.pwd(&mut buf), Ok(1));
    }

    #[test]
    fn test_malloc_free_pairs() {
        let arena = Box::leak(vec![0u8; 8192].into_boxed_slice());
        let mut ctx = Context::new().with_heap(arena);
        for (size, align) in [(1, 1), (3, 2), (16, 16), (100, 8), (1000, 64), (0, 4096)] {
            let ptr = ctx.malloc(size, align).unwrap();
            assert!(!ptr.is_null());
            assert_eq!(ptr as usize % align, 0);
            unsafe { ctx.free(ptr, size, align) };
        }
        assert_eq!(ctx.heap().in_use(), 0);
        assert_eq!(ctx.malloc(8, 6), Err(Error::InvalidArg));
        assert_eq!(ctx.malloc(1 << 20, 8), Err(Error::OutOfMemory));
    }
}
