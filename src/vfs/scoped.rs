/*!
 * Scoped Filesystem
 * Capability object confined to one trusted root
 *
 * Every operation validates its name against the trusted root, both
 * lexically and after symlink resolution, before any storage I/O. Storage
 * is then addressed by the original relative name through the cache facade,
 * which keys its entries by the resolved real path.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::cache::{CacheStats, CacheStore, CachedFS};
use super::config::ScopeConfig;
use super::local::LocalFS;
use super::paths;
use super::traits::{FileSystem, OpenFile, WritableFile, WriteFileSystem};
use super::types::*;
use crate::monitoring::OperationSpan;

/// Shared state behind both the read-write and read-only scope types
struct Scope {
    trusted_root: PathBuf,
    config: ScopeConfig,
    storage: CachedFS<LocalFS>,
}

impl Scope {
    fn new(directory: &Path, config: ScopeConfig, readonly: bool) -> VfsResult<Self> {
        let absolute = if directory.is_absolute() {
            directory.to_path_buf()
        } else {
            let base = std::env::current_dir()
                .map_err(|e| VfsError::from_io(e, "resolve current directory"))?;
            base.join(directory)
        };

        let trusted_root = std::fs::canonicalize(&absolute).map_err(|e| {
            VfsError::from_io(e, format!("resolve scope root {}", absolute.display()))
        })?;

        Self::at(trusted_root, config, CacheStore::from_config(&config), readonly)
    }

    /// Build a scope at an already canonical root
    fn at(
        trusted_root: PathBuf,
        config: ScopeConfig,
        store: Option<Arc<CacheStore>>,
        readonly: bool,
    ) -> VfsResult<Self> {
        let md = std::fs::metadata(&trusted_root).map_err(|e| {
            VfsError::from_io(e, format!("stat scope root {}", trusted_root.display()))
        })?;
        if !md.is_dir() {
            return Err(VfsError::NotADirectory(trusted_root.display().to_string()));
        }

        let backend = if readonly {
            LocalFS::readonly(&trusted_root)
        } else {
            LocalFS::new(&trusted_root)
        };
        let storage = CachedFS::with_store(backend, store);

        debug!(
            root = %trusted_root.display(),
            readonly,
            cache_group = %storage.group(),
            caching = config.is_caching_enabled(),
            "scope created"
        );

        Ok(Self {
            trusted_root,
            config,
            storage,
        })
    }

    /// Validate `name`, then run `op` against storage inside an operation span
    fn run<T>(
        &self,
        operation: &'static str,
        name: &Path,
        op: impl FnOnce(&CachedFS<LocalFS>, &Path) -> VfsResult<T>,
    ) -> VfsResult<T> {
        let span = OperationSpan::new(operation, &self.trusted_root, name);
        let _entered = span.enter();

        let result =
            paths::validate(name, &self.trusted_root).and_then(|real| op(&self.storage, &real));
        span.record_result(&result);
        result
    }

    /// Child scope at a validated descendant; config inherited, fresh cache group
    fn child(&self, name: &Path, readonly: bool) -> VfsResult<Self> {
        let span = OperationSpan::new("sub", &self.trusted_root, name);
        let _entered = span.enter();

        let result = paths::validate(name, &self.trusted_root).and_then(|resolved| {
            Self::at(
                resolved,
                self.config,
                self.storage.store().cloned(),
                readonly,
            )
        });
        span.record_result(&result);
        result
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        self.storage.store().map(|store| store.stats())
    }
}

/// Read-write scope
///
/// ```no_run
/// use std::path::Path;
/// use scopefs::{FileSystem, ScopeConfig, ScopedFs, WriteFileSystem};
///
/// let fs = ScopedFs::new("/srv/tenants/alice", ScopeConfig::default())?;
/// let docs = fs.sub(Path::new("docs"))?;
/// docs.write_file(Path::new("todo.txt"), b"ship it")?;
/// assert!(docs.open(Path::new("../../bob/secret")).is_err());
/// # Ok::<(), scopefs::VfsError>(())
/// ```
pub struct ScopedFs {
    scope: Scope,
}

impl std::fmt::Debug for ScopedFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedFs")
            .field("trusted_root", &self.scope.trusted_root)
            .finish_non_exhaustive()
    }
}

impl ScopedFs {
    /// Create a scope rooted at `directory`
    ///
    /// A relative `directory` is resolved against the current working
    /// directory now, not at each operation. The directory must exist.
    pub fn new(directory: impl AsRef<Path>, config: ScopeConfig) -> VfsResult<Self> {
        Ok(Self {
            scope: Scope::new(directory.as_ref(), config, false)?,
        })
    }

    /// Narrow to the descendant directory `name`
    pub fn sub(&self, name: &Path) -> VfsResult<ScopedFs> {
        Ok(Self {
            scope: self.scope.child(name, false)?,
        })
    }

    /// Read-only view of the same root
    pub fn read_only(&self) -> VfsResult<ReadOnlyScopedFs> {
        Ok(ReadOnlyScopedFs {
            scope: Scope::at(
                self.scope.trusted_root.clone(),
                self.scope.config,
                self.scope.storage.store().cloned(),
                true,
            )?,
        })
    }

    pub fn trusted_root(&self) -> &Path {
        &self.scope.trusted_root
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.scope.config
    }

    /// Statistics of the cache shared by this scope tree, if caching is on
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.scope.cache_stats()
    }
}

impl FileSystem for ScopedFs {
    fn open(&self, name: &Path) -> VfsResult<Box<dyn OpenFile>> {
        self.scope.run("open", name, |s, real| s.open(name, real))
    }

    fn read_dir(&self, name: &Path) -> VfsResult<Vec<Entry>> {
        self.scope.run("read_dir", name, |s, real| s.read_dir(name, real))
    }

    fn stat(&self, name: &Path) -> VfsResult<Metadata> {
        self.scope.run("stat", name, |s, real| s.stat(name, real))
    }

    fn read_file(&self, name: &Path) -> VfsResult<Vec<u8>> {
        self.scope.run("read_file", name, |s, real| s.read_file(name, real))
    }

    fn sub_fs(&self, name: &Path) -> VfsResult<Box<dyn FileSystem>> {
        Ok(Box::new(self.sub(name)?))
    }

    fn as_writable(&self) -> Option<&dyn WriteFileSystem> {
        Some(self)
    }
}

impl WriteFileSystem for ScopedFs {
    fn create(&self, name: &Path) -> VfsResult<Box<dyn WritableFile>> {
        self.scope.run("create", name, |s, real| s.create(name, real))
    }
}

/// Scope without the write capability
pub struct ReadOnlyScopedFs {
    scope: Scope,
}

impl ReadOnlyScopedFs {
    pub fn new(directory: impl AsRef<Path>, config: ScopeConfig) -> VfsResult<Self> {
        Ok(Self {
            scope: Scope::new(directory.as_ref(), config, true)?,
        })
    }

    pub fn sub(&self, name: &Path) -> VfsResult<ReadOnlyScopedFs> {
        Ok(Self {
            scope: self.scope.child(name, true)?,
        })
    }

    pub fn trusted_root(&self) -> &Path {
        &self.scope.trusted_root
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.scope.config
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.scope.cache_stats()
    }
}

impl FileSystem for ReadOnlyScopedFs {
    fn open(&self, name: &Path) -> VfsResult<Box<dyn OpenFile>> {
        self.scope.run("open", name, |s, real| s.open(name, real))
    }

    fn read_dir(&self, name: &Path) -> VfsResult<Vec<Entry>> {
        self.scope.run("read_dir", name, |s, real| s.read_dir(name, real))
    }

    fn stat(&self, name: &Path) -> VfsResult<Metadata> {
        self.scope.run("stat", name, |s, real| s.stat(name, real))
    }

    fn read_file(&self, name: &Path) -> VfsResult<Vec<u8>> {
        self.scope.run("read_file", name, |s, real| s.read_file(name, real))
    }

    fn sub_fs(&self, name: &Path) -> VfsResult<Box<dyn FileSystem>> {
        Ok(Box::new(self.sub(name)?))
    }
}
