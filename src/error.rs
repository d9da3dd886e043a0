use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("device does not hold a monofs image (magic mismatch)")]
    InvalidFormat,
    #[error("stored block size does not match {}", crate::config::BLOCK_SIZE)]
    UnsupportedBlockSize,
    #[error("object or block ceiling reached")]
    ResourceExhausted,
    #[error("no free data block left in the bitmap")]
    OutOfSpace,
    #[error("inode table is full")]
    TableFull,
    #[error("no such entry")]
    NotFound,
    #[error("file name exceeds {} bytes", crate::config::FILENAME_MAXLEN)]
    NameTooLong,
    #[error("file name is empty or contains '/' or NUL")]
    InvalidName,
    #[error("metadata is inconsistent")]
    InternalConsistency,
    #[error("not a directory")]
    NotDirectory,
    #[error("not a regular file")]
    NotRegular,
    #[error("directory block has no free entry slot")]
    DirectoryFull,
    #[error("write does not fit in a single block")]
    FileTooLarge,
    #[error("block index out of device range")]
    InvalidBlockId,
    #[error("timed out waiting for a lock")]
    LockTimeout,
    #[error("block device I/O failed")]
    IoError,
}

impl FsError {
    /// Negative errno the VFS glue hands back to the kernel.
    pub fn errno(&self) -> i32 {
        const EPERM: i32 = 1;
        const ENOENT: i32 = 2;
        const EIO: i32 = 5;
        const ENOTDIR: i32 = 20;
        const EISDIR: i32 = 21;
        const EINVAL: i32 = 22;
        const EFBIG: i32 = 27;
        const ENAMETOOLONG: i32 = 36;

        let code = match self {
            FsError::ResourceExhausted
            | FsError::OutOfSpace
            | FsError::TableFull
            | FsError::DirectoryFull => EPERM,
            FsError::NotFound => ENOENT,
            FsError::NameTooLong => ENAMETOOLONG,
            FsError::InvalidName | FsError::InvalidFormat | FsError::UnsupportedBlockSize => {
                EINVAL
            }
            FsError::NotDirectory => ENOTDIR,
            FsError::NotRegular => EISDIR,
            FsError::FileTooLarge => EFBIG,
            FsError::InternalConsistency
            | FsError::InvalidBlockId
            | FsError::LockTimeout
            | FsError::IoError => EIO,
        };
        -code
    }
}

pub type Result<T> = core::result::Result<T, FsError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_errno() {
        assert_eq!(FsError::ResourceExhausted.errno(), -1);
        assert_eq!(FsError::NotFound.errno(), -2);
        assert_eq!(FsError::InternalConsistency.errno(), -5);
        assert_eq!(FsError::LockTimeout.errno(), -5);
        assert_eq!(FsError::NameTooLong.errno(), -36);
    }
}
