/*!
 * VFS Error Types
 * Structured, type-safe error handling for scoped filesystem operations
 */

use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::ErrorKind;
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// Scoped operations can be rejected by the sandbox and must be handled
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS errors with structured, type-safe error handling
///
/// All error variants include context strings that should be non-empty.
/// Serialization uses tagged enum pattern for type safety.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Path is outside of trusted root: {0}")]
    #[diagnostic(
        code(vfs::outside_trusted_root),
        help("The path escapes the sandbox through '..' segments or a symlink. Use a path inside the scope.")
    )]
    OutsideTrustedRoot(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not found: {0}")]
    #[diagnostic(code(vfs::not_found))]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    #[diagnostic(code(vfs::already_exists))]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Permission denied: {0}")]
    #[diagnostic(
        code(vfs::permission_denied),
        help("The host filesystem refused access. Check ownership and mode bits of the scope root.")
    )]
    PermissionDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Not a directory: {0}")]
    #[diagnostic(code(vfs::not_a_directory))]
    NotADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Is a directory: {0}")]
    #[diagnostic(code(vfs::is_a_directory))]
    IsADirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid path: {0}")]
    #[diagnostic(code(vfs::invalid_path))]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(vfs::io))]
    Io(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(vfs::invalid_argument))]
    InvalidArgument(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Read-only filesystem")]
    #[diagnostic(
        code(vfs::read_only),
        help("This scope was opened without the write capability.")
    )]
    ReadOnly,
}

impl VfsError {
    /// Map a host I/O error into the VFS taxonomy, tagging it with `context`
    pub fn from_io(e: std::io::Error, context: impl Into<String>) -> Self {
        let context = context.into();
        match e.kind() {
            ErrorKind::NotFound => VfsError::NotFound(context),
            ErrorKind::PermissionDenied => VfsError::PermissionDenied(context),
            ErrorKind::AlreadyExists => VfsError::AlreadyExists(context),
            ErrorKind::NotADirectory => VfsError::NotADirectory(context),
            ErrorKind::IsADirectory => VfsError::IsADirectory(context),
            _ => VfsError::Io(format!("{}: {}", context, e)),
        }
    }

    /// True when the sandbox rejected the request, as opposed to a storage failure
    #[inline]
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, VfsError::OutsideTrustedRoot(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
