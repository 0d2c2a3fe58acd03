/*!
 * VFS Traits
 * Capability surface of a scope and the storage seam underneath it
 */

use std::io::{Read, Seek, Write};
use std::path::Path;

use super::types::*;

/// Read capability set of a sandboxed scope
///
/// Every name is relative to the scope's trusted root. Implementations
/// validate the name before any storage I/O and reject escapes with
/// [`VfsError::OutsideTrustedRoot`].
pub trait FileSystem: Send + Sync {
    /// Open a file for reading
    fn open(&self, name: &Path) -> VfsResult<Box<dyn OpenFile>>;

    /// List a directory, sorted by name
    fn read_dir(&self, name: &Path) -> VfsResult<Vec<Entry>>;

    /// Metadata of an entry, following symlinks
    fn stat(&self, name: &Path) -> VfsResult<Metadata>;

    /// Read entire file contents
    fn read_file(&self, name: &Path) -> VfsResult<Vec<u8>> {
        let mut file = self.open(name)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| VfsError::from_io(e, format!("read {}", name.display())))?;
        Ok(buf)
    }

    /// Narrow to a descendant directory
    fn sub_fs(&self, name: &Path) -> VfsResult<Box<dyn FileSystem>>;

    /// Capability query for writes; `None` means unsupported, not an error
    fn as_writable(&self) -> Option<&dyn WriteFileSystem> {
        None
    }
}

/// Write capability, implemented only by scopes that may create files
pub trait WriteFileSystem: FileSystem {
    /// Create or truncate a file. Parent directories must already exist.
    fn create(&self, name: &Path) -> VfsResult<Box<dyn WritableFile>>;

    /// Create a file and write `data` to it
    fn write_file(&self, name: &Path, data: &[u8]) -> VfsResult<()> {
        let mut file = self.create(name)?;
        file.write_all(data)
            .map_err(|e| VfsError::from_io(e, format!("write {}", name.display())))?;
        file.sync()
    }
}

/// Open file handle. Closed when dropped.
pub trait OpenFile: Read + Seek + Send {
    fn metadata(&self) -> VfsResult<Metadata>;
}

/// File handle returned by [`WriteFileSystem::create`]
pub trait WritableFile: OpenFile + Write {
    /// Flush and sync file data to storage
    fn sync(&mut self) -> VfsResult<()>;
}

impl std::fmt::Debug for dyn OpenFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OpenFile")
    }
}

impl std::fmt::Debug for dyn WritableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WritableFile")
    }
}

/// Real storage a scope delegates to once a name has been validated
///
/// Backends address entries relative to their own root, which equals the
/// owning scope's trusted root.
pub trait Backend: Send + Sync {
    fn open(&self, name: &Path) -> VfsResult<Box<dyn OpenFile>>;

    fn read_file(&self, name: &Path) -> VfsResult<Vec<u8>>;

    fn read_dir(&self, name: &Path) -> VfsResult<Vec<Entry>>;

    fn stat(&self, name: &Path) -> VfsResult<Metadata>;

    fn create(&self, name: &Path) -> VfsResult<Box<dyn WritableFile>>;
}
