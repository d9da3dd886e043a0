//! Path resolution and manipulation utilities.

use crate::{BlockDevice, Error, FileSystem, Inode, Result, ROOT_INODE_NO};

/// Splits a path into its parent part and final component.
/// e.g. "/a/b.txt" -> ("/a", "b.txt"), "b.txt" -> ("/", "b.txt")
pub fn split(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(idx) => (&trimmed[..idx], &trimmed[idx + 1..]),
        None => ("/", trimmed),
    }
}

impl<D: BlockDevice> FileSystem<D> {
    /// Resolves a path to inode numbers, starting from the root.
    /// Returns a tuple of (parent inode number, inode number).
    pub fn resolve(&self, path: &str) -> Result<(u64, u64)> {
        let mut parent = ROOT_INODE_NO;
        let mut current = ROOT_INODE_NO;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            let inode = self.lookup(current, component)?;
            parent = current;
            current = inode.inode_no;
        }
        Ok((parent, current))
    }

    pub fn lookup_path(&self, path: &str) -> Result<Inode> {
        let (_, inode_no) = self.resolve(path)?;
        self.stat(inode_no)
    }

    /// Resolves the parent of `path` and hands back its inode number with the final name.
    pub fn resolve_parent<'p>(&self, path: &'p str) -> Result<(u64, &'p str)> {
        let (parent_path, name) = split(path);
        if name.is_empty() {
            return Err(Error::InvalidName);
        }
        let (_, parent) = self.resolve(parent_path)?;
        Ok((parent, name))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_split() {
        assert_eq!(split("/a/b.txt"), ("/a", "b.txt"));
        assert_eq!(split("/a"), ("/", "a"));
        assert_eq!(split("a"), ("/", "a"));
        assert_eq!(split("/a/b/"), ("/a", "b"));
        assert_eq!(split("/"), ("/", ""));
    }
}
