use alloc::{boxed::Box, format, string::String, sync::Arc, vec::Vec};
use core::time::Duration;

use crate::bitmap::alloc_data_block;
use crate::directory::{dir_append, dir_list, dir_lookup};
use crate::file::{fread, fwrite};
use crate::inode::{format_inode_table, InodeTable};
use crate::lock::{TimedMutex, TimedMutexGuard};
use crate::superblock::{write_superblock, SuperblockManager};
use crate::block_dev::write_block_sync;
use crate::structs::{DirEntry, Inode, Mode, SuperBlock};
use crate::config::*;
use crate::{BlockDevice, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
    /// Upper bound on any single lock acquisition.
    pub lock_timeout: Duration,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            lock_timeout: LOCK_TIMEOUT,
        }
    }
}

/// Directory iteration cursor, in bytes (one `DIR_ENTRY_SIZE` stride per entry).
/// A cursor that is not at zero has already been iterated to the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirContext {
    pub pos: u64,
}

/// Open-file position for callers that want sequential reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle {
    pub inode_no: u64,
    pub pos: u64,
}

pub struct FileSystem<D: BlockDevice> {
    device: Arc<D>,
    superblock: SuperblockManager,
    inode_table: InodeTable,
    // Indexed by inode_no - 1. Guards directory appends and file writes.
    inode_locks: Box<[TimedMutex<()>]>,
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn format(device: Arc<D>) -> Result<Self> {
        Self::format_with(device, MountOptions::default())
    }

    /// Writes a fresh image holding only the root directory, then mounts it.
    pub fn format_with(device: Arc<D>, options: MountOptions) -> Result<Self> {
        if device.block_size() != BLOCK_SIZE {
            return Err(Error::UnsupportedBlockSize);
        }
        let num_blocks = device.num_blocks();
        if num_blocks <= ROOT_DATA_BLOCK as usize {
            return Err(Error::OutOfSpace);
        }

        let zero_block = Box::new([0u8; BLOCK_SIZE]);
        write_block_sync(&*device, ROOT_DATA_BLOCK, zero_block.as_slice())?;
        let root = Inode::new(ROOT_INODE_NO, Mode::TY_DIR | Mode::from_bits_truncate(0o755), ROOT_DATA_BLOCK);
        format_inode_table(&*device, &root)?;
        // Superblock last: the magic is what makes the image mountable.
        write_superblock(&*device, &SuperBlock::new(num_blocks))?;
        log::info!("formatted {} blocks, {} usable objects", num_blocks, MAX_OBJECTS);

        Self::mount_with(device, options)
    }

    pub fn mount(device: Arc<D>) -> Result<Self> {
        Self::mount_with(device, MountOptions::default())
    }

    pub fn mount_with(device: Arc<D>, options: MountOptions) -> Result<Self> {
        if device.block_size() != BLOCK_SIZE {
            return Err(Error::UnsupportedBlockSize);
        }
        let superblock = SuperblockManager::load(&*device, options.lock_timeout)?;
        let snapshot = superblock.snapshot()?;
        log::info!(
            "mounted monofs v{}, {} inodes, {} free blocks",
            snapshot.version,
            snapshot.inodes_count,
            snapshot.free_block_count()
        );

        let inode_locks = (0..MAX_OBJECTS)
            .map(|_| TimedMutex::with_timeout((), options.lock_timeout))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let fs = Self {
            device,
            superblock,
            inode_table: InodeTable::new(options.lock_timeout),
            inode_locks,
        };

        match fs.find_inode(ROOT_INODE_NO) {
            Ok(root) if root.is_dir() => Ok(fs),
            Ok(_) | Err(Error::NotFound) => {
                log::error!("root directory missing from inode table");
                Err(Error::InternalConsistency)
            }
            Err(e) => Err(e),
        }
    }

    /// Persists the superblock once more and flushes the device.
    pub fn unmount(self) -> Result<()> {
        self.superblock.persist(&*self.device)?;
        self.device.flush()?;
        log::info!("unmounted");
        Ok(())
    }

    fn inode_lock(&self, inode_no: u64) -> Result<TimedMutexGuard<'_, ()>> {
        let idx = inode_no.checked_sub(1).ok_or(Error::NotFound)? as usize;
        self.inode_locks.get(idx).ok_or(Error::NotFound)?.lock()
    }

    fn inodes_count(&self) -> Result<u64> {
        Ok(self.superblock.lock()?.inodes_count)
    }

    fn find_inode(&self, inode_no: u64) -> Result<Inode> {
        let count = self.inodes_count()?;
        self.inode_table.find(&*self.device, count, inode_no)
    }

    /// Looks up an inode some directory entry points at; a miss is corruption.
    fn find_referenced(&self, inode_no: u64) -> Result<Inode> {
        self.find_inode(inode_no).map_err(|e| match e {
            Error::NotFound => {
                log::error!("directory entry points at missing inode {}", inode_no);
                Error::InternalConsistency
            }
            e => e,
        })
    }

    fn save_inode(&self, inode: &Inode) -> Result<()> {
        let count = self.inodes_count()?;
        self.inode_table
            .update(&*self.device, count, inode)
            .map_err(|e| match e {
                Error::NotFound => {
                    log::error!("inode {} vanished from the inode table", inode.inode_no);
                    Error::InternalConsistency
                }
                e => e,
            })
    }

    pub fn stat(&self, inode_no: u64) -> Result<Inode> {
        self.find_inode(inode_no)
    }

    pub fn root(&self) -> Result<Inode> {
        self.find_inode(ROOT_INODE_NO)
    }

    /// Resolves `name` inside directory `parent`.
    pub fn lookup(&self, parent: u64, name: &str) -> Result<Inode> {
        log::debug!("lookup {:?} in inode {}", name, parent);
        let dir = self.find_inode(parent)?;
        let inode_no = dir_lookup(&*self.device, &dir, name.as_bytes())?;
        self.find_referenced(inode_no)
    }

    /// Creates an empty regular file in `parent`. Only permission bits of `mode` are kept.
    pub fn create(&self, parent: u64, name: &str, mode: Mode) -> Result<Inode> {
        log::debug!("create {:?} in inode {}", name, parent);
        self.create_object(parent, name, mode.perm() | Mode::TY_REG)
    }

    /// Creates an empty directory in `parent`. Only permission bits of `mode` are kept.
    pub fn mkdir(&self, parent: u64, name: &str, mode: Mode) -> Result<Inode> {
        log::debug!("mkdir {:?} in inode {}", name, parent);
        self.create_object(parent, name, mode.perm() | Mode::TY_DIR)
    }

    fn create_object(&self, parent_no: u64, name: &str, mode: Mode) -> Result<Inode> {
        DirEntry::new(0, name.as_bytes())?;

        // Held until the parent's children count is persisted.
        let _dir_guard = self.inode_lock(parent_no)?;
        let mut parent = self.find_inode(parent_no)?;
        if !parent.is_dir() {
            return Err(Error::NotDirectory);
        }
        if parent.dir_children_count as usize >= ENTRIES_PER_DIR {
            log::warn!("directory {} has no free entry slot", parent_no);
            return Err(Error::ResourceExhausted);
        }

        let inode = {
            let mut superblock = self.superblock.lock()?;
            let count = superblock.inodes_count;
            if count as usize >= MAX_OBJECTS {
                log::warn!("can not hold more objects ({} of {})", count, MAX_OBJECTS);
                return Err(Error::ResourceExhausted);
            }
            let block = alloc_data_block(&*self.device, &mut superblock).map_err(|e| match e {
                Error::OutOfSpace => {
                    log::warn!("no free data block for {:?}", name);
                    Error::ResourceExhausted
                }
                e => e,
            })?;
            let inode = Inode::new(count + 1, mode, block);
            self.inode_table
                .append(&*self.device, &mut superblock, &inode)
                .map_err(|e| {
                    log::error!("block {} allocated but inode {} not recorded: {}", block, count + 1, e);
                    e
                })?;
            inode
        };

        // The inode is committed from here on; there is no way back.
        let linked = dir_append(&*self.device, &parent, name.as_bytes(), inode.inode_no)
            .and_then(|_| {
                parent.dir_children_count += 1;
                self.save_inode(&parent)
            });
        if let Err(e) = linked {
            log::error!(
                "inode {} created but not linked into directory {}: {}",
                inode.inode_no,
                parent_no,
                e
            );
            return Err(Error::InternalConsistency);
        }

        log::debug!("created {:?} as inode {} in block {}", name, inode.inode_no, inode.data_block_number);
        Ok(inode)
    }

    /// Reads from `offset` into `buf`; returns bytes copied, 0 at end of file.
    pub fn read(&self, inode_no: u64, offset: usize, buf: &mut [u8]) -> Result<usize> {
        log::debug!("read {} bytes at {} from inode {}", buf.len(), offset, inode_no);
        let inode = self.find_inode(inode_no)?;
        fread(&*self.device, &inode, offset, buf)
    }

    /// Writes `data` at `offset`; the file size becomes `offset + data.len()`.
    pub fn write(&self, inode_no: u64, offset: usize, data: &[u8]) -> Result<usize> {
        log::debug!("write {} bytes at {} to inode {}", data.len(), offset, inode_no);
        let _file_guard = self.inode_lock(inode_no)?;
        let mut inode = self.find_inode(inode_no)?;
        let written = fwrite(&*self.device, &mut inode, offset, data)?;
        self.save_inode(&inode)?;
        Ok(written)
    }

    /// Emits every entry of directory `dir` in creation order, advancing `ctx.pos`
    /// one entry stride per entry. Single pass: a non-zero cursor yields nothing.
    pub fn iterate<F>(&self, dir: u64, ctx: &mut DirContext, mut emit: F) -> Result<usize>
    where
        F: FnMut(&DirEntry),
    {
        if ctx.pos != 0 {
            return Ok(0);
        }
        let dir = self.find_inode(dir)?;
        let entries = dir_list(&*self.device, &dir)?;
        for entry in entries.iter() {
            emit(entry);
            ctx.pos += DIR_ENTRY_SIZE as u64;
        }
        Ok(entries.len())
    }

    pub fn read_dir(&self, dir: u64) -> Result<Vec<DirEntry>> {
        let dir = self.find_inode(dir)?;
        dir_list(&*self.device, &dir)
    }

    pub fn open(&self, inode_no: u64) -> Result<FileHandle> {
        let inode = self.find_inode(inode_no)?;
        if !inode.is_file() {
            return Err(Error::NotRegular);
        }
        Ok(FileHandle { inode_no, pos: 0 })
    }

    /// Reads at the handle's position and advances it.
    pub fn read_from(&self, handle: &mut FileHandle, buf: &mut [u8]) -> Result<usize> {
        let n = self.read(handle.inode_no, handle.pos as usize, buf)?;
        handle.pos += n as u64;
        Ok(n)
    }

    /// Writes at the handle's position and advances it.
    pub fn write_to(&self, handle: &mut FileHandle, data: &[u8]) -> Result<usize> {
        let n = self.write(handle.inode_no, handle.pos as usize, data)?;
        handle.pos += n as u64;
        Ok(n)
    }

    /// Walks the persisted metadata and checks the cross-structure invariants:
    /// unique inode numbers and blocks, every block marked used, every entry resolvable.
    pub fn check(&self) -> Result<()> {
        let superblock = self.superblock.snapshot()?;
        if superblock.is_free(SUPERBLOCK_BLOCK) || superblock.is_free(INODE_TABLE_BLOCK) {
            log::error!("reserved blocks marked free");
            return Err(Error::InternalConsistency);
        }

        let records = self.inode_table.records(&*self.device, superblock.inodes_count)?;
        let mut seen_inodes = 0u64;
        let mut seen_blocks = 0u64;
        for record in records.iter() {
            let ino = record.inode_no;
            let block = record.data_block_number;
            if ino == 0
                || ino > MAX_OBJECTS as u64
                || block < RESERVED_BLOCKS as u64
                || block >= BITMAP_BITS as u64
                || superblock.is_free(block)
                || seen_inodes & (1 << (ino - 1)) != 0
                || seen_blocks & (1 << block) != 0
            {
                log::error!("bad inode record {:?}", record);
                return Err(Error::InternalConsistency);
            }
            seen_inodes |= 1 << (ino - 1);
            seen_blocks |= 1 << block;
        }

        for dir in records.iter().filter(|r| r.is_dir()) {
            for entry in dir_list(&*self.device, dir)? {
                if entry.inode_no == 0
                    || entry.inode_no > MAX_OBJECTS as u64
                    || seen_inodes & (1 << (entry.inode_no - 1)) == 0
                {
                    log::error!("entry {:?} in directory {} is dangling", entry.name_str(), dir.inode_no);
                    return Err(Error::InternalConsistency);
                }
            }
        }
        Ok(())
    }

    pub fn superblock(&self) -> Result<SuperBlock> {
        self.superblock.snapshot()
    }

    pub fn free_block_count(&self) -> Result<u32> {
        Ok(self.superblock.snapshot()?.free_block_count())
    }

    pub fn root_inode_no(&self) -> u64 {
        ROOT_INODE_NO
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }

    /// Human readable summary of the superblock and inode table.
    pub fn dump(&self) -> Result<String> {
        let superblock = self.superblock.snapshot()?;
        let mut out = format!(
            "monofs v{} block_size={} inodes={} free_blocks={:#066b}\n",
            superblock.version, superblock.block_size, superblock.inodes_count, superblock.free_blocks
        );
        for record in self.inode_table.records(&*self.device, superblock.inodes_count)? {
            out += &format!(
                "  inode {:>2} mode={:o} block={:>2} size={} children={}\n",
                record.inode_no,
                record.mode().bits(),
                record.data_block_number,
                record.file_size,
                record.dir_children_count
            );
        }
        Ok(out)
    }
}
