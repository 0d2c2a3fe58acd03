/*!
 * User Identity
 * Identity supplied by the authentication layer and bound to one scope
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::serde::pathbuf_string;
use crate::vfs::VfsError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Regular,
    Service,
    Superuser,
}

impl Role {
    /// Single-letter code used by the user directory
    pub const fn code(&self) -> &'static str {
        match self {
            Role::Regular => "u",
            Role::Service => "s",
            Role::Superuser => "r",
        }
    }

    /// Role for a directory code; unknown codes are `Regular`
    pub fn from_code(code: &str) -> Self {
        match code {
            "s" => Role::Service,
            "r" => Role::Superuser,
            _ => Role::Regular,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Regular => write!(f, "regular"),
            Role::Service => write!(f, "service"),
            Role::Superuser => write!(f, "superuser"),
        }
    }
}

impl FromStr for Role {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Role::Regular),
            "service" => Ok(Role::Service),
            "superuser" => Ok(Role::Superuser),
            other => Err(VfsError::InvalidArgument(format!("unknown role: {}", other))),
        }
    }
}

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "pathbuf_string")]
    pub home: PathBuf,
    #[serde(default)]
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, role: Role, home: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            role,
            home: home.into(),
            email: String::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}
