/*!
 * User Storage
 * Binds an authenticated user to a scope rooted at their home directory
 */

mod user;

pub use user::{Role, User};

use std::path::Path;

use tracing::info;

use crate::vfs::{
    Entry, FileSystem, Metadata, OpenFile, ReadOnlyScopedFs, ScopeConfig, ScopedFs, VfsResult,
    WriteFileSystem,
};

enum Binding {
    ReadWrite(ScopedFs),
    ReadOnly(ReadOnlyScopedFs),
}

/// One user, one scope
///
/// Relative home directories resolve against the current working directory
/// when the storage is created.
pub struct Storage {
    user: User,
    fs: Binding,
}

impl Storage {
    /// Read-write storage rooted at `user.home`
    pub fn new(user: User, config: ScopeConfig) -> VfsResult<Self> {
        let fs = ScopedFs::new(&user.home, config)?;
        info!(user = %user.name, role = %user.role, root = %fs.trusted_root().display(), "storage bound");
        Ok(Self {
            user,
            fs: Binding::ReadWrite(fs),
        })
    }

    /// Storage without the write capability
    pub fn readonly(user: User, config: ScopeConfig) -> VfsResult<Self> {
        let fs = ReadOnlyScopedFs::new(&user.home, config)?;
        info!(user = %user.name, role = %user.role, root = %fs.trusted_root().display(), "read-only storage bound");
        Ok(Self {
            user,
            fs: Binding::ReadOnly(fs),
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// The bound scope
    pub fn fs(&self) -> &dyn FileSystem {
        match &self.fs {
            Binding::ReadWrite(fs) => fs,
            Binding::ReadOnly(fs) => fs,
        }
    }

    pub fn trusted_root(&self) -> &Path {
        match &self.fs {
            Binding::ReadWrite(fs) => fs.trusted_root(),
            Binding::ReadOnly(fs) => fs.trusted_root(),
        }
    }
}

impl FileSystem for Storage {
    fn open(&self, name: &Path) -> VfsResult<Box<dyn OpenFile>> {
        self.fs().open(name)
    }

    fn read_dir(&self, name: &Path) -> VfsResult<Vec<Entry>> {
        self.fs().read_dir(name)
    }

    fn stat(&self, name: &Path) -> VfsResult<Metadata> {
        self.fs().stat(name)
    }

    fn read_file(&self, name: &Path) -> VfsResult<Vec<u8>> {
        self.fs().read_file(name)
    }

    fn sub_fs(&self, name: &Path) -> VfsResult<Box<dyn FileSystem>> {
        self.fs().sub_fs(name)
    }

    fn as_writable(&self) -> Option<&dyn WriteFileSystem> {
        self.fs().as_writable()
    }
}
