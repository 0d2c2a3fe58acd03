/*!
 * scopefs
 * Per-tenant sandboxed filesystem scopes with traversal and symlink-escape protection
 */

pub mod core;
pub mod monitoring;
pub mod storage;
pub mod vfs;

// Re-exports
pub use monitoring::init_tracing;
pub use storage::{Role, Storage, User};
pub use vfs::{
    walk, Entry, FileSystem, FileType, Metadata, OpenFile, ReadOnlyScopedFs, ScopeConfig,
    ScopedFs, VfsError, VfsResult, WritableFile, WriteFileSystem,
};
