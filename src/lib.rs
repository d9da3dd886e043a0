//! Monofs is a minimal block-based file system: every file and directory lives in
//! exactly one block, and all metadata fits in two.
//! There is no deletion, no rename and no permission enforcement beyond storing a mode.
//!
//! Monofs's on-disk layout:
//! - Block 0: Superblock (magic, version, block size, inode count, free-block bitmap)
//! - Block 1: Inode Table (packed inode records)
//! - Block 2..: Data Blocks, one per file or directory (block 2 is the root directory)
//!
//! Monofs's layers (from bottom to top):
//! 1. Block Device: synchronous read/write of one block.        | User implemented (hardware-specific)
//! 2. Superblock/Bitmap: format identity and block allocation.  | Superblock lock
//! 3. Inode Table: append, find and update inode records.       | Inode table lock
//! 4. Directory/File: content of a single data block.           | Per-inode lock
//! 5. FileSystem: lookup, create, mkdir, read, write, iterate.  | Called by the VFS glue
//!
//! Locks are always taken in the order per-inode, superblock, inode table.

extern crate alloc;
#[macro_use]
extern crate bitflags;

mod config;
mod block_dev;
mod lock;
mod structs;
mod bitmap;
mod superblock;
mod inode;
mod directory;
mod path;
mod file;
mod fs;
mod error;

pub use block_dev::BlockDevice;
pub use config::*;
pub use lock::{TimedMutex, TimedMutexGuard};
pub use superblock::*;
pub use structs::{DirEntry, FileType, Inode, Mode, SuperBlock};
pub use bitmap::*;
pub use inode::*;
pub use path::*;
pub use directory::*;
pub use file::*;
pub use fs::*;
pub use error::FsError as Error;
pub use error::Result;
