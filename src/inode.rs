//! The inode table: one block at `INODE_TABLE_BLOCK` holding a packed array
//! of `Inode` records, valid for slots `[0, inodes_count)`.
//! Lookups are linear scans; the object count is small and bounded.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::time::Duration;

use crate::block_dev::write_block_sync;
use crate::lock::TimedMutex;
use crate::structs::{read_record, write_record};
use crate::superblock::write_superblock;
use crate::{BlockDevice, Inode, Result, SuperBlock, BLOCK_SIZE, INODE_RECORD_SIZE, INODE_TABLE_BLOCK, MAX_OBJECTS};
use crate::error::FsError;

fn read_table(device: &impl BlockDevice, buf: &mut [u8; BLOCK_SIZE]) -> Result<()> {
    device.read_block(INODE_TABLE_BLOCK, buf.as_mut_slice())
}

/// Slot index of `inode_no` among the first `count` records.
fn search(buf: &[u8; BLOCK_SIZE], count: u64, inode_no: u64) -> Result<Option<usize>> {
    for slot in 0..count as usize {
        let record: Inode = read_record(buf.as_slice(), slot * INODE_RECORD_SIZE)?;
        if record.inode_no == inode_no {
            return Ok(Some(slot));
        }
    }
    Ok(None)
}

/// Writes a table block holding only `root`.
pub fn format_inode_table(device: &impl BlockDevice, root: &Inode) -> Result<()> {
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    write_record(buf.as_mut_slice(), 0, root)?;
    write_block_sync(device, INODE_TABLE_BLOCK, buf.as_slice())
}

pub struct InodeTable {
    lock: TimedMutex<()>,
}

impl InodeTable {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            lock: TimedMutex::with_timeout((), lock_timeout),
        }
    }

    /// Appends `record` at slot `inodes_count`, then bumps and persists the count.
    /// The caller holds the superblock lock, which is why it can hand us `superblock`.
    pub fn append(
        &self,
        device: &impl BlockDevice,
        superblock: &mut SuperBlock,
        record: &Inode,
    ) -> Result<()> {
        let count = superblock.inodes_count;
        if count as usize >= MAX_OBJECTS {
            return Err(FsError::TableFull);
        }

        {
            let _table = self.lock.lock()?;
            let mut buf = Box::new([0u8; BLOCK_SIZE]);
            read_table(device, &mut buf)?;
            write_record(buf.as_mut_slice(), count as usize * INODE_RECORD_SIZE, record)?;
            write_block_sync(device, INODE_TABLE_BLOCK, buf.as_slice())?;
        }

        superblock.inodes_count += 1;
        if let Err(e) = write_superblock(device, superblock) {
            // The slot past the persisted count is invisible on disk; keep memory the same.
            superblock.inodes_count -= 1;
            return Err(e);
        }
        Ok(())
    }

    /// Linear scan over the first `count` slots.
    pub fn find(&self, device: &impl BlockDevice, count: u64, inode_no: u64) -> Result<Inode> {
        let _table = self.lock.lock()?;
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        read_table(device, &mut buf)?;
        match search(&buf, count, inode_no)? {
            Some(slot) => read_record(buf.as_slice(), slot * INODE_RECORD_SIZE),
            None => Err(FsError::NotFound),
        }
    }

    /// Overwrites the slot holding `record.inode_no` in place.
    pub fn update(&self, device: &impl BlockDevice, count: u64, record: &Inode) -> Result<()> {
        let _table = self.lock.lock()?;
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        read_table(device, &mut buf)?;
        let slot = search(&buf, count, record.inode_no)?.ok_or(FsError::NotFound)?;
        write_record(buf.as_mut_slice(), slot * INODE_RECORD_SIZE, record)?;
        write_block_sync(device, INODE_TABLE_BLOCK, buf.as_slice())
    }

    /// All live records, in creation order.
    pub fn records(&self, device: &impl BlockDevice, count: u64) -> Result<Vec<Inode>> {
        let _table = self.lock.lock()?;
        let mut buf = Box::new([0u8; BLOCK_SIZE]);
        read_table(device, &mut buf)?;
        (0..count as usize)
            .map(|slot| read_record(buf.as_slice(), slot * INODE_RECORD_SIZE))
            .collect()
    }
}
