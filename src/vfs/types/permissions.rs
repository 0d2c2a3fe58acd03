/*!
 * VFS Permissions
 * Unix-style mode bits reported by `stat`
 */

use serde::{Deserialize, Serialize};

/// File permissions (Unix-style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permissions {
    pub mode: u32,
}

impl Permissions {
    /// Create permissions, masking to the permission bits
    #[inline]
    #[must_use]
    pub const fn new(mode: u32) -> Self {
        Self {
            mode: mode & 0o7777,
        }
    }

    #[inline]
    #[must_use]
    pub const fn readonly() -> Self {
        Self { mode: 0o444 }
    }

    #[inline]
    #[must_use]
    pub const fn readwrite() -> Self {
        Self { mode: 0o644 }
    }

    /// No owner write bit
    #[inline]
    #[must_use]
    pub const fn is_readonly(&self) -> bool {
        self.mode & 0o200 == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_executable(&self) -> bool {
        self.mode & 0o111 != 0
    }

    pub(crate) fn from_std(perms: &std::fs::Permissions) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Self::new(perms.mode())
        }
        #[cfg(not(unix))]
        {
            if perms.readonly() {
                Self::readonly()
            } else {
                Self::readwrite()
            }
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::readwrite()
    }
}
