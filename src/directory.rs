//! Directory content: a dense, append-only array of `DirEntry` records in the
//! directory's single data block. Only the first `dir_children_count` slots are
//! meaningful; nothing past them is ever read back.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::block_dev::write_block_sync;
use crate::BlockDevice;
use crate::error::{FsError, Result};
use crate::config::*;
use crate::structs::*;

pub fn trim_zero(name: &[u8]) -> &[u8] {
    let mut end = name.len();
    while end > 0 && name[end - 1] == 0 {
        end -= 1;
    }
    &name[..end]
}

fn name_cmp(n1: &[u8], n2: &[u8]) -> bool {
    trim_zero(n1) == trim_zero(n2)
}

impl DirEntry {
    /// Stored name without the zero padding.
    pub fn name(&self) -> &[u8] {
        trim_zero(&self.name)
    }

    pub fn name_str(&self) -> Option<&str> {
        core::str::from_utf8(self.name()).ok()
    }

    pub fn name_eq(&self, name: &[u8]) -> bool {
        name_cmp(&self.name, name)
    }
}

fn children_count(dir: &Inode) -> Result<usize> {
    if !dir.is_dir() {
        return Err(FsError::NotDirectory);
    }
    let count = dir.dir_children_count as usize;
    if count > ENTRIES_PER_DIR {
        log::error!("directory {} claims {} children", dir.inode_no, count);
        return Err(FsError::InternalConsistency);
    }
    Ok(count)
}

/// Entries of `dir` in creation order, exactly `dir_children_count` of them.
pub fn dir_list(device: &impl BlockDevice, dir: &Inode) -> Result<Vec<DirEntry>> {
    let count = children_count(dir)?;
    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(dir.data_block_number, buf.as_mut_slice())?;
    (0..count)
        .map(|i| read_record(buf.as_slice(), i * DIR_ENTRY_SIZE))
        .collect()
}

/// Query inode number of an entry by name in the directory.
/// Returns the first match; duplicate names are tolerated.
pub fn dir_lookup(device: &impl BlockDevice, dir: &Inode, name: &[u8]) -> Result<u64> {
    let count = children_count(dir)?;
    if name.len() > FILENAME_MAXLEN {
        return Err(FsError::NameTooLong);
    }

    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(dir.data_block_number, buf.as_mut_slice())?;
    for i in 0..count {
        let entry: DirEntry = read_record(buf.as_slice(), i * DIR_ENTRY_SIZE)?;
        if entry.name_eq(name) {
            log::trace!(
                "found {:?} as inode {} in directory {}",
                entry.name_str(),
                entry.inode_no,
                dir.inode_no
            );
            return Ok(entry.inode_no);
        }
    }

    Err(FsError::NotFound)
}

/// Writes a new entry at slot `dir_children_count` and persists the block.
/// Bumping and persisting the children count is the caller's job, under the
/// same directory lock.
pub fn dir_append(
    device: &impl BlockDevice,
    dir: &Inode,
    name: &[u8],
    child_inode_no: u64,
) -> Result<()> {
    let entry = DirEntry::new(child_inode_no, name)?;
    let count = children_count(dir)?;
    if count >= ENTRIES_PER_DIR {
        return Err(FsError::DirectoryFull);
    }

    let mut buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(dir.data_block_number, buf.as_mut_slice())?;
    write_record(buf.as_mut_slice(), count * DIR_ENTRY_SIZE, &entry)?;
    write_block_sync(device, dir.data_block_number, buf.as_slice())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_name_cmp() {
        assert_eq!(name_cmp(b"test", b"test"), true);
        assert_eq!(name_cmp(b"test", b"test1"), false);
        assert_eq!(name_cmp(b"test", b"tes"), false);
        assert_eq!(name_cmp(b"test\0\0", b"test"), true);
    }

    #[test]
    fn test_dir_entry_name() {
        let entry = DirEntry::new(7, b"b.txt").unwrap();
        assert_eq!(entry.name(), b"b.txt");
        assert_eq!(entry.name_str(), Some("b.txt"));
        assert!(entry.name_eq(b"b.txt"));
        assert_eq!(DirEntry::new(7, &[b'x'; FILENAME_MAXLEN + 1]), Err(FsError::NameTooLong));
        assert_eq!(DirEntry::new(7, b""), Err(FsError::InvalidName));
        assert_eq!(DirEntry::new(7, b"a/b"), Err(FsError::InvalidName));
        assert!(DirEntry::new(7, &[b'x'; FILENAME_MAXLEN]).is_ok());
    }
}
