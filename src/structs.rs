use core::mem::size_of;

use crate::config::*;
use crate::Error;
use crate::Result;

/// Records that are copied verbatim in and out of block buffers.
///
/// # Safety
/// Implementors must be `#[repr(C)]`, contain no implicit padding and accept
/// every bit pattern (plain integers and byte arrays only).
pub(crate) unsafe trait OnDisk: Copy {}

/// Copies a record out of `buf` at byte `offset`.
pub(crate) fn read_record<T: OnDisk>(buf: &[u8], offset: usize) -> Result<T> {
    if offset + size_of::<T>() > buf.len() {
        return Err(Error::InternalConsistency);
    }
    let record = unsafe { core::ptr::read_unaligned(buf.as_ptr().add(offset) as *const T) };
    Ok(record)
}

/// Copies the bytes of `record` into `buf` at byte `offset`.
pub(crate) fn write_record<T: OnDisk>(buf: &mut [u8], offset: usize, record: &T) -> Result<()> {
    if offset + size_of::<T>() > buf.len() {
        return Err(Error::InternalConsistency);
    }
    unsafe {
        core::ptr::write_unaligned(buf.as_mut_ptr().add(offset) as *mut T, *record);
    }
    Ok(())
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub version: u64,
    pub magic: u64,        // Identifies the format, never rewritten after format
    pub block_size: u64,   // Fixed to BLOCK_SIZE
    pub inodes_count: u64, // Number of inodes ever created, only grows
    pub free_blocks: u64,  // One bit per block, 1 = free
}

unsafe impl OnDisk for SuperBlock {}

impl SuperBlock {
    /// Fresh superblock for a device of `num_blocks` blocks holding only the root.
    /// Blocks past the end of the device are marked used so they are never handed out.
    pub fn new(num_blocks: usize) -> Self {
        let mut free_blocks = !0u64;
        for id in 0..=ROOT_DATA_BLOCK {
            free_blocks &= !(1 << id);
        }
        if num_blocks < BITMAP_BITS {
            free_blocks &= (1u64 << num_blocks) - 1;
        }
        Self {
            version: VERSION,
            magic: MAGIC,
            block_size: BLOCK_SIZE as u64,
            inodes_count: 1,
            free_blocks,
        }
    }

    pub fn is_free(&self, block_id: u64) -> bool {
        block_id < BITMAP_BITS as u64 && self.free_blocks & (1 << block_id) != 0
    }

    pub fn free_block_count(&self) -> u32 {
        self.free_blocks.count_ones()
    }
}

bitflags! {
    pub struct Mode: u32 {
        // File type
        /// Regular File
        const TY_REG = 0o100000;
        /// Directory File
        const TY_DIR = 0o040000;

        const S_UID = 0o4000;
        const S_GID = 0o2000;
        /// Sticky bit
        const S_VTX = 0o1000;

        // File access permissions
        const PERM_R_USR = 0o400;
        const PERM_W_USR = 0o200;
        const PERM_X_USR = 0o100;
        const PERM_RWX_USR = Self::PERM_R_USR.bits | Self::PERM_W_USR.bits | Self::PERM_X_USR.bits;

        const PERM_R_GRP = 0o040;
        const PERM_W_GRP = 0o020;
        const PERM_X_GRP = 0o010;
        const PERM_RWX_GRP = Self::PERM_R_GRP.bits | Self::PERM_W_GRP.bits | Self::PERM_X_GRP.bits;

        const PERM_R_OTH = 0o004;
        const PERM_W_OTH = 0o002;
        const PERM_X_OTH = 0o001;
        const PERM_RWX_OTH = Self::PERM_R_OTH.bits | Self::PERM_W_OTH.bits | Self::PERM_X_OTH.bits;
    }
}

impl Mode {
    pub fn is_dir(&self) -> bool {
        self.contains(Mode::TY_DIR)
    }

    pub fn is_file(&self) -> bool {
        self.contains(Mode::TY_REG)
    }

    /// Permission and special bits with the type stripped.
    pub fn perm(&self) -> Mode {
        *self - (Mode::TY_DIR | Mode::TY_REG)
    }

    pub fn file_type(&self) -> Option<FileType> {
        if self.is_dir() {
            Some(FileType::Directory)
        } else if self.is_file() {
            Some(FileType::Regular)
        } else {
            None
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular = 1,
    Directory = 2,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub inode_no: u64,
    mode: u32,
    _pad: u32,
    pub data_block_number: u64, // The single block holding this inode's content
    pub file_size: u64,         // Regular files only
    pub dir_children_count: u64, // Directories only
}

unsafe impl OnDisk for Inode {}

const _: () = assert!(size_of::<Inode>() == INODE_RECORD_SIZE);
const _: () = assert!(size_of::<SuperBlock>() <= BLOCK_SIZE);

impl Inode {
    pub fn new(inode_no: u64, mode: Mode, data_block_number: u64) -> Self {
        Self {
            inode_no,
            mode: mode.bits(),
            _pad: 0,
            data_block_number,
            file_size: 0,
            dir_children_count: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        Mode::from_bits_truncate(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.mode().is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.mode().is_file()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub name: [u8; FILENAME_MAXLEN],
    _pad: u8,
    pub inode_no: u64,
}

unsafe impl OnDisk for DirEntry {}

const _: () = assert!(size_of::<DirEntry>() == DIR_ENTRY_SIZE);

impl DirEntry {
    pub const NULL: Self = Self {
        name: [0; FILENAME_MAXLEN],
        _pad: 0,
        inode_no: 0,
    };

    pub fn new(inode_no: u64, name: &[u8]) -> Result<Self> {
        if name.len() > FILENAME_MAXLEN {
            return Err(Error::NameTooLong);
        }
        if name.is_empty() || name.iter().any(|&c| c == b'/' || c == 0) {
            return Err(Error::InvalidName);
        }
        Ok(Self {
            name: {
                let mut arr = [0; FILENAME_MAXLEN];
                arr[..name.len()].copy_from_slice(name);
                arr
            },
            _pad: 0,
            inode_no,
        })
    }
}
