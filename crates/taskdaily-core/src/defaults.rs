//! Centralized default constants for TaskDaily.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own.

// =============================================================================
// AUTOSAVE
// =============================================================================

/// Inactivity window before an edited entry is committed to the store.
pub const AUTOSAVE_DEBOUNCE_MS: u64 = 1000;

/// Upper bound accepted for the autosave debounce window.
pub const AUTOSAVE_DEBOUNCE_MAX_MS: u64 = 60_000;

/// Capacity of the autosave event broadcast channel.
pub const AUTOSAVE_EVENT_CAPACITY: usize = 256;

// =============================================================================
// TAGS
// =============================================================================

/// Maximum characters in an explicitly created tag name.
pub const TAG_NAME_MAX_LEN: usize = 100;

/// Largest configurable tag name length.
pub const TAG_NAME_MAX_LEN_LIMIT: usize = 255;

/// Number of colors in the hashtag highlight palette.
pub const TAG_PALETTE_SIZE: usize = 15;

// =============================================================================
// LOGGING
// =============================================================================

/// Default `RUST_LOG` filter for binaries.
pub const LOG_FILTER: &str = "taskdaily=info,taskdaily_core=info,taskdaily_db=info,taskdaily_jobs=info";
