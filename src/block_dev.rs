use crate::error::FsError;

/// Synchronous block storage the filesystem sits on.
/// Durability of a written block is the device's business once `flush` returns.
pub trait BlockDevice: Send + Sync {
    /// Returns the number of blocks in the block device.
    fn num_blocks(&self) -> usize;

    /// Reads a block of data from the block device.
    /// buf.len() must be equal to block_size().
    fn read_block(&self, block_id: u64, buf: &mut [u8]) -> Result<(), FsError>;

    /// Writes a block of data to the block device.
    /// buf.len() must be equal to block_size().
    fn write_block(&self, block_id: u64, buf: &[u8]) -> Result<(), FsError>;

    /// Flushes any buffered writes down to stable storage.
    fn flush(&self) -> Result<(), FsError>;

    /// Returns the size of each block in bytes.
    fn block_size(&self) -> usize {
        crate::config::BLOCK_SIZE
    }
}

/// Writes a block and waits for it to hit the device.
pub(crate) fn write_block_sync(
    device: &impl BlockDevice,
    block_id: u64,
    buf: &[u8],
) -> Result<(), FsError> {
    device.write_block(block_id, buf)?;
    device.flush()
}
