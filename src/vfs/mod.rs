/*!
 * Virtual File System Module
 * Sandboxed filesystem scopes over a host directory tree
 */

pub mod cache;
pub mod config;
pub mod local;
pub mod paths;
pub mod scoped;
pub mod traits;
pub mod types;
pub mod walk;

// Re-exports
pub use cache::{CacheStats, CacheStore, CachedFS};
pub use config::ScopeConfig;
pub use local::LocalFS;
pub use scoped::{ReadOnlyScopedFs, ScopedFs};
pub use traits::{Backend, FileSystem, OpenFile, WritableFile, WriteFileSystem};
pub use types::{Entry, FileType, Metadata, Permissions, VfsError, VfsResult};
pub use walk::walk;
