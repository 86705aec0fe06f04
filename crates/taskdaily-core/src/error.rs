//! Error types for TaskDaily.

use thiserror::Error;

/// Result type alias using TaskDaily's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TaskDaily operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Backing store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(uuid::Uuid),

    /// A tag with this name already exists (unique constraint on name)
    #[error("Duplicate tag: {0}")]
    DuplicateTag(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is a name-uniqueness conflict that can be recovered
    /// by re-fetching the existing record.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::DuplicateTag(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("connection reset".to_string());
        assert_eq!(err.to_string(), "Storage error: connection reset");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("daily 2026-01-05".to_string());
        assert_eq!(err.to_string(), "Not found: daily 2026-01-05");
    }

    #[test]
    fn test_error_display_tag_not_found() {
        let id = Uuid::nil();
        let err = Error::TagNotFound(id);
        assert_eq!(err.to_string(), format!("Tag not found: {}", id));
    }

    #[test]
    fn test_error_display_duplicate_tag() {
        let err = Error::DuplicateTag("work".to_string());
        assert_eq!(err.to_string(), "Duplicate tag: work");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty tag name".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty tag name");
    }

    #[test]
    fn test_is_duplicate() {
        assert!(Error::DuplicateTag("home".to_string()).is_duplicate());
        assert!(!Error::Storage("timeout".to_string()).is_duplicate());
        assert!(!Error::TagNotFound(Uuid::nil()).is_duplicate());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
