//! Regular file content, held entirely in the inode's single data block.

use alloc::boxed::Box;

use crate::block_dev::write_block_sync;
use crate::{BlockDevice, Error, Inode, Result, BLOCK_SIZE};

/// Reads file data starting at `offset` into `buffer`.
/// Returns the number of bytes read, 0 at or past end of file.
pub fn fread(
    device: &impl BlockDevice,
    inode: &Inode,
    offset: usize,
    buffer: &mut [u8],
) -> Result<usize> {
    if !inode.is_file() {
        return Err(Error::NotRegular);
    }
    let size = inode.file_size as usize;
    if size > BLOCK_SIZE {
        log::error!("inode {} records size {} past its block", inode.inode_no, size);
        return Err(Error::InternalConsistency);
    }
    if offset >= size {
        return Ok(0);
    }

    let bytes_read = buffer.len().min(size - offset);
    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(inode.data_block_number, block_buf.as_mut_slice())?;
    buffer[..bytes_read].copy_from_slice(&block_buf[offset..offset + bytes_read]);

    Ok(bytes_read)
}

/// Writes `buffer` into the data block at `offset` and sets the file size to
/// `offset + buffer.len()`. The updated inode still has to be saved by the caller.
pub fn fwrite(
    device: &impl BlockDevice,
    inode: &mut Inode,
    offset: usize,
    buffer: &[u8],
) -> Result<usize> {
    if !inode.is_file() {
        return Err(Error::NotRegular);
    }
    let end = offset.checked_add(buffer.len()).ok_or(Error::FileTooLarge)?;
    if end > BLOCK_SIZE {
        return Err(Error::FileTooLarge);
    }

    let mut block_buf = Box::new([0u8; BLOCK_SIZE]);
    device.read_block(inode.data_block_number, block_buf.as_mut_slice())?;
    block_buf[offset..end].copy_from_slice(buffer);
    write_block_sync(device, inode.data_block_number, block_buf.as_slice())?;

    inode.file_size = end as u64;
    Ok(buffer.len())
}
