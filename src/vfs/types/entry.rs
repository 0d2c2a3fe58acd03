/*!
 * VFS Directory Entry
 * One row of a `read_dir` listing
 */

use super::errors::VfsError;
use super::file_type::FileType;
use crate::core::serde::is_default;
use serde::{Deserialize, Deserializer, Serialize};

/// Directory entry
///
/// Names are single path components: non-empty, no NUL, no separators.
/// Entries order by name so listings are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    #[serde(deserialize_with = "deserialize_valid_filename")]
    pub name: String,
    #[serde(skip_serializing_if = "is_default", default)]
    pub file_type: FileType,
}

impl Entry {
    pub fn new(name: impl Into<String>, file_type: FileType) -> Result<Self, VfsError> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(Self { name, file_type })
    }

    /// Names read back from the host are already single components
    pub(crate) fn new_unchecked(name: String, file_type: FileType) -> Self {
        Self { name, file_type }
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

    pub fn validate_name(name: &str) -> Result<(), VfsError> {
        if let Some(reason) = invalid_reason(name) {
            return Err(VfsError::InvalidPath(reason.into()));
        }
        Ok(())
    }
}

fn invalid_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("entry name cannot be empty")
    } else if name.contains('\0') {
        Some("entry name cannot contain null bytes")
    } else if name.contains('/') || name.contains('\\') {
        Some("entry name cannot contain path separators")
    } else {
        None
    }
}

fn deserialize_valid_filename<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    match invalid_reason(&name) {
        Some(reason) => Err(serde::de::Error::custom(reason)),
        None => Ok(name),
    }
}
