/*!
 * VFS Metadata
 * Result of `stat` inside a scope
 */

use super::file_type::FileType;
use super::permissions::Permissions;
use crate::core::serde::{is_zero_u64, system_time_micros};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// File metadata
///
/// `name` is the final component of the requested path (`.` for the scope
/// root itself), mirroring what a directory listing would show.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Metadata {
    pub name: String,
    pub file_type: FileType,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub size: u64,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(with = "system_time_micros")]
    pub modified: SystemTime,
}

impl Metadata {
    pub(crate) fn from_std(name: String, md: &std::fs::Metadata) -> Self {
        Self {
            name,
            file_type: md.file_type().into(),
            size: md.len(),
            permissions: Permissions::from_std(&md.permissions()),
            modified: md.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    #[inline]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }

    /// Approximate heap + inline footprint, used for cache accounting
    pub(crate) fn footprint(&self) -> usize {
        std::mem::size_of::<Self>() + self.name.len()
    }
}
