/*!
 * Scope Configuration
 */

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::time::Duration;

use super::types::{VfsError, VfsResult};
use crate::core::limits::{
    DEFAULT_CACHE_DURATION, DEFAULT_CACHE_SIZE_BYTES, ENV_CACHE_SIZE, ENV_CACHE_TTL_MS,
};

/// Per-scope cache settings, fixed at construction and inherited by sub-scopes
///
/// A zero `cache_duration` disables caching entirely.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    #[serde(default = "default_cache_size")]
    pub cache_size_bytes: u64,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "cache_duration_ms", default)]
    pub cache_duration: Duration,
}

fn default_cache_size() -> u64 {
    DEFAULT_CACHE_SIZE_BYTES
}

impl ScopeConfig {
    pub const fn new(cache_size_bytes: u64, cache_duration: Duration) -> Self {
        Self {
            cache_size_bytes,
            cache_duration,
        }
    }

    /// Reads always go to storage
    pub const fn uncached() -> Self {
        Self::new(DEFAULT_CACHE_SIZE_BYTES, Duration::ZERO)
    }

    #[inline]
    pub fn is_caching_enabled(&self) -> bool {
        !self.cache_duration.is_zero() && self.cache_size_bytes > 0
    }

    /// Defaults overridden by `SCOPEFS_CACHE_SIZE` and `SCOPEFS_CACHE_TTL_MS`
    pub fn from_env() -> VfsResult<Self> {
        let mut config = Self::default();
        if let Some(size) = env_u64(ENV_CACHE_SIZE)? {
            config.cache_size_bytes = size;
        }
        if let Some(ms) = env_u64(ENV_CACHE_TTL_MS)? {
            config.cache_duration = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE_BYTES, DEFAULT_CACHE_DURATION)
    }
}

fn env_u64(var: &str) -> VfsResult<Option<u64>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| VfsError::InvalidArgument(format!("{} must be an unsigned integer, got {:?}", var, raw))),
        Err(_) => Ok(None),
    }
}
