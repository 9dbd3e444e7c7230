//! OS Runtime
//!
//! A reference implementation of every operation in the table, for the OS
//! side of the boundary.
//!
//! # Structure
//! - [`Context`]: handles, volumes, current directory, heap, console
//! - [`Volume`] / [`RamVolume`]: storage seam and an in-memory backend
//! - [`Console`]: the device behind handles 0..=2
//! - [`syscall`]: installs a `Context` behind the static [`crate::Api`]
//!
//! # Loading an Application
//! ```ignore
//! let mut ctx = Context::new().with_heap(arena);
//! ctx.mount("SD", RamVolume::new())?;
//! let api = syscall::install(ctx);
//! let code = (app_entry)(api);
//! ```

mod console;
mod context;
mod handles;
mod heap;
mod location;
mod ramdisk;
pub mod syscall;
mod volume;

pub use console::{Console, MemoryConsole, NullConsole, IOCTL_INPUT_PENDING};
pub use context::Context;
pub use handles::{HandleTable, Object, OpenDir, OpenFile, Slot, MAX_HANDLES};
pub use heap::AppHeap;
pub use location::Location;
pub use ramdisk::RamVolume;
pub use volume::Volume;
