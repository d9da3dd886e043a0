use alloc::boxed::Box;
use core::time::Duration;

use crate::block_dev::write_block_sync;
use crate::config::*;
use crate::lock::{TimedMutex, TimedMutexGuard};
use crate::structs::{read_record, write_record};
use crate::{error::FsError, BlockDevice, Result, SuperBlock};

pub fn read_superblock<D: BlockDevice>(device: &D) -> Result<SuperBlock> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(SUPERBLOCK_BLOCK, buf.as_mut_slice())?;
    let superblock: SuperBlock = read_record(buf.as_slice(), 0)?;

    if superblock.magic != MAGIC {
        log::error!("magic {:#x} does not match {:#x}", superblock.magic, MAGIC);
        return Err(FsError::InvalidFormat);
    }
    if superblock.block_size != BLOCK_SIZE as u64 {
        log::error!("block size {} is not {}", superblock.block_size, BLOCK_SIZE);
        return Err(FsError::UnsupportedBlockSize);
    }

    Ok(superblock)
}

/// Copies the superblock into a zeroed block buffer and writes it through.
pub fn write_superblock<D: BlockDevice>(device: &D, superblock: &SuperBlock) -> Result<()> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    write_record(buf.as_mut_slice(), 0, superblock)?;
    write_block_sync(device, SUPERBLOCK_BLOCK, buf.as_slice())
}

/// Owner of the in-memory superblock and of the lock guarding it.
/// Anything touching `inodes_count` or the bitmap goes through `lock`,
/// and persists before the guard is dropped.
pub struct SuperblockManager {
    superblock: TimedMutex<SuperBlock>,
}

impl SuperblockManager {
    pub fn load<D: BlockDevice>(device: &D, lock_timeout: Duration) -> Result<Self> {
        let superblock = read_superblock(device)?;
        Ok(Self::new(superblock, lock_timeout))
    }

    pub fn new(superblock: SuperBlock, lock_timeout: Duration) -> Self {
        Self {
            superblock: TimedMutex::with_timeout(superblock, lock_timeout),
        }
    }

    pub fn lock(&self) -> Result<TimedMutexGuard<'_, SuperBlock>> {
        self.superblock.lock()
    }

    pub fn persist<D: BlockDevice>(&self, device: &D) -> Result<()> {
        let superblock = self.lock()?;
        write_superblock(device, &superblock)
    }

    /// Copy of the current in-memory state.
    pub fn snapshot(&self) -> Result<SuperBlock> {
        Ok(*self.lock()?)
    }
}
