use core::time::Duration;

pub const MAGIC: u64 = 0x2020_0406;
pub const VERSION: u64 = 1;

pub const BLOCK_SIZE: usize = 4096;
pub const SUPERBLOCK_BLOCK: u64 = 0; // Block ID for the superblock
pub const INODE_TABLE_BLOCK: u64 = 1; // Block ID for the packed inode table
pub const ROOT_DATA_BLOCK: u64 = 2; // Content block of the root directory
pub const ROOT_INODE_NO: u64 = 1;

pub const BITMAP_BITS: usize = 64; // Width of the free-block bitmap
pub const RESERVED_BLOCKS: usize = 2; // Superblock and inode table

pub const INODE_RECORD_SIZE: usize = 40;
pub const INODE_TABLE_CAPACITY: usize = BLOCK_SIZE / INODE_RECORD_SIZE;

/// Every object owns exactly one data block, so the object ceiling is the number
/// of addressable data blocks, bounded by what the inode table can hold.
pub const MAX_OBJECTS: usize = if BITMAP_BITS - RESERVED_BLOCKS < INODE_TABLE_CAPACITY {
    BITMAP_BITS - RESERVED_BLOCKS
} else {
    INODE_TABLE_CAPACITY
};

pub const FILENAME_MAXLEN: usize = 255;
pub const DIR_ENTRY_SIZE: usize = 264; // Name, one pad byte, inode number
pub const ENTRIES_PER_DIR: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;

pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
