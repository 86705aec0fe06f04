//! Structured logging schema and field name constants for TaskDaily.
//!
//! All crates use these constants for consistent structured logging fields.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (e.g. tagging failed, content saved) |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration (individual tags, links, keystrokes) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "core", "db", "jobs", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "tag_linker", "autosave", "registry"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ensure_tags_exist", "tag_content", "commit"
pub const OPERATION: &str = "op";

/// User on whose behalf the operation runs.
pub const USER_ID: &str = "user_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Owner reference (`task:<uuid>` or `daily:<uuid>`).
pub const OWNER: &str = "owner";

/// Tag UUID being operated on.
pub const TAG_ID: &str = "tag_id";

/// Tag name being operated on.
pub const TAG_NAME: &str = "tag_name";

/// Content revision number.
pub const REVISION: &str = "revision";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of tag names given to an operation.
pub const NAME_COUNT: &str = "name_count";

/// Number of tags that already existed.
pub const EXISTING_COUNT: &str = "existing_count";

/// Number of tags created.
pub const CREATED_COUNT: &str = "created_count";

/// Number of links newly inserted.
pub const LINKED_COUNT: &str = "linked_count";

/// Byte length of the content being saved or scanned.
pub const CONTENT_LEN: &str = "content_len";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
