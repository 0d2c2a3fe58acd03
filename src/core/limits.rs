/*!
 * Scope Limits and Constants
 *
 * Defaults for scope configuration and cache accounting.
 */

use std::time::Duration;

// =============================================================================
// CACHE
// =============================================================================

/// Default cache budget per scope tree (10MB)
pub const DEFAULT_CACHE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Default cache TTL. Zero means caching is off until configured.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::ZERO;

/// Fixed per-entry overhead charged against the byte budget
/// (key, timestamps, LRU links), so empty files and listings still cost space
pub const CACHE_ENTRY_OVERHEAD: usize = 64;

/// Fixed per-name overhead charged for each row of a cached directory listing
pub const CACHE_DIR_ENTRY_OVERHEAD: usize = 16;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Cache budget in bytes
pub const ENV_CACHE_SIZE: &str = "SCOPEFS_CACHE_SIZE";

/// Cache TTL in milliseconds, 0 disables
pub const ENV_CACHE_TTL_MS: &str = "SCOPEFS_CACHE_TTL_MS";

/// Emit JSON logs when "1" or "true"
pub const ENV_TRACE_JSON: &str = "SCOPEFS_TRACE_JSON";
