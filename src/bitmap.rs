//! Free-block allocation over the 64-bit bitmap kept in the superblock.
//! Bits 0 and 1 (superblock and inode table) are never handed out.
//! Allocation is one-way: nothing in this filesystem frees a block.

use alloc::boxed::Box;

use crate::block_dev::write_block_sync;
use crate::superblock::{write_superblock, SuperblockManager};
use crate::{config::*, BlockDevice, Result, SuperBlock};
use crate::error::FsError;

/// Index of the first free bit at or above `RESERVED_BLOCKS`.
pub fn first_free_block(free_blocks: u64) -> Option<u64> {
    (RESERVED_BLOCKS as u64..BITMAP_BITS as u64).find(|&i| free_blocks & (1 << i) != 0)
}

/// Reserves the first free data block, zeroes it and persists the bitmap.
/// Caller must hold the superblock lock (it owns `superblock`).
pub fn alloc_data_block(
    device: &impl BlockDevice,
    superblock: &mut SuperBlock,
) -> Result<u64> {
    let block_id = first_free_block(superblock.free_blocks).ok_or(FsError::OutOfSpace)?;
    if block_id as usize >= device.num_blocks() {
        return Err(FsError::InvalidBlockId);
    }

    let zero_block = Box::new([0u8; BLOCK_SIZE]);
    write_block_sync(device, block_id, zero_block.as_slice())?;

    superblock.free_blocks &= !(1 << block_id);
    if let Err(e) = write_superblock(device, superblock) {
        // Keep memory in line with what is on disk.
        superblock.free_blocks |= 1 << block_id;
        return Err(e);
    }

    log::debug!("allocated block {}", block_id);
    Ok(block_id)
}

impl SuperblockManager {
    /// Standalone allocation: takes the superblock lock for this one step.
    pub fn allocate(&self, device: &impl BlockDevice) -> Result<u64> {
        let mut superblock = self.lock()?;
        alloc_data_block(device, &mut superblock)
    }
}
