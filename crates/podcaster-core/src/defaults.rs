//! Centralized default constants.
//!
//! Configuration falls back to these values when the environment does not
//! override them.

// =============================================================================
// DATABASE
// =============================================================================

/// Database URL used when `DATABASE_URL` is not set.
pub const DATABASE_URL: &str = "postgres://localhost/podcaster";

/// Maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Minimum number of pooled connections kept open.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Connection acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Maximum connection lifetime in seconds (30 minutes).
pub const DB_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// CATEGORY HIERARCHY
// =============================================================================

/// Cycle rejection on category parent updates is off unless configured.
pub const CATEGORY_REJECT_CYCLES: bool = false;

/// Maximum number of ancestors visited when walking a category chain.
pub const CATEGORY_MAX_DEPTH: usize = 64;
