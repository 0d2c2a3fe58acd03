/*!
 * VFS Types
 * Shared types for scoped filesystem operations
 */

mod entry;
mod errors;
mod file_type;
mod metadata;
mod permissions;

pub use entry::Entry;
pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
pub use metadata::Metadata;
pub use permissions::Permissions;
