//! Error types module
//!
//! Every failure in mediashelf is expressed as an `AppError`. Collection policy
//! violations (count, size, type) live next to the infrastructure failures so the
//! HTTP boundary can map all of them through a single `ErrorMetadata` table.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejected requests worth noticing
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "TOO_MANY_FILES")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Max file count in {collection} is {max}, a batch would leave {count} files")]
    TooManyFiles {
        max: u64,
        count: i64,
        collection: String,
    },

    #[error("File has a size of {size} bytes, the maximum for {collection} is {max} bytes")]
    FileTooBig {
        size: u64,
        max: u64,
        collection: String,
    },

    #[error("File has a mime type of {mime_type}, while only {} are allowed", .allowed.join(", "))]
    MimeTypeNotAllowed {
        mime_type: String,
        allowed: Vec<String>,
    },

    #[error("File does not exist: {0}")]
    FileDoesNotExist(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No thumb_200 conversion registered for collection {0}")]
    ThumbsNotConfigured(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::TooManyFiles { .. } => (
            422,
            "TOO_MANY_FILES",
            false,
            Some("Remove files from the collection or submit fewer additions"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileTooBig { .. } => (
            413,
            "FILE_TOO_BIG",
            false,
            Some("Reduce file size below the collection limit"),
            false,
            LogLevel::Debug,
        ),
        AppError::MimeTypeNotAllowed { .. } => (
            415,
            "MIME_TYPE_NOT_ALLOWED",
            false,
            Some("Upload a file of an accepted type"),
            false,
            LogLevel::Debug,
        ),
        AppError::FileDoesNotExist(_) => (
            404,
            "FILE_DOES_NOT_EXIST",
            false,
            Some("Upload the file again before referencing it"),
            false,
            LogLevel::Debug,
        ),
        AppError::PermissionDenied(_) => (
            403,
            "PERMISSION_DENIED",
            false,
            Some("Request the required permission from an administrator"),
            false,
            LogLevel::Warn,
        ),
        AppError::ThumbsNotConfigured(_) => (
            500,
            "THUMBS_NOT_CONFIGURED",
            false,
            Some("Register a thumb_200 conversion for the collection"),
            false,
            LogLevel::Error,
        ),
        AppError::InvalidOperation(_) => (
            422,
            "INVALID_OPERATION",
            false,
            Some("Check the id, path and action of each operation"),
            false,
            LogLevel::Debug,
        ),
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            422,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check authentication token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::TooManyFiles { .. } => "TooManyFiles",
            AppError::FileTooBig { .. } => "FileTooBig",
            AppError::MimeTypeNotAllowed { .. } => "MimeTypeNotAllowed",
            AppError::FileDoesNotExist(_) => "FileDoesNotExist",
            AppError::PermissionDenied(_) => "PermissionDenied",
            AppError::ThumbsNotConfigured(_) => "ThumbsNotConfigured",
            AppError::InvalidOperation(_) => "InvalidOperation",
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::TooManyFiles { .. }
            | AppError::FileTooBig { .. }
            | AppError::MimeTypeNotAllowed { .. }
            | AppError::ThumbsNotConfigured(_) => self.to_string(),
            AppError::FileDoesNotExist(_) => "File not found".to_string(),
            AppError::PermissionDenied(_) => "This action is unauthorized".to_string(),
            AppError::InvalidOperation(ref msg) => msg.clone(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_too_many_files() {
        let err = AppError::TooManyFiles {
            max: 2,
            count: 3,
            collection: "documents".to_string(),
        };
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(err.error_code(), "TOO_MANY_FILES");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains("documents"));
        assert!(err.client_message().contains('3'));
    }

    #[test]
    fn test_error_metadata_file_too_big() {
        let err = AppError::FileTooBig {
            size: 2049,
            max: 2048,
            collection: "gallery".to_string(),
        };
        assert_eq!(err.http_status_code(), 413);
        assert_eq!(err.error_code(), "FILE_TOO_BIG");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_mime_type_message_lists_allowed_types() {
        let err = AppError::MimeTypeNotAllowed {
            mime_type: "text/plain".to_string(),
            allowed: vec!["application/pdf".to_string(), "image/*".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "File has a mime type of text/plain, while only application/pdf, image/* are allowed"
        );
        assert_eq!(err.http_status_code(), 415);
    }

    #[test]
    fn test_view_errors_map_to_forbidden_and_not_found() {
        let denied = AppError::PermissionDenied("vop.view".to_string());
        assert_eq!(denied.http_status_code(), 403);
        assert_eq!(denied.log_level(), LogLevel::Warn);

        let missing = AppError::FileDoesNotExist("abc/file.pdf".to_string());
        assert_eq!(missing.http_status_code(), 404);
        assert_eq!(missing.client_message(), "File not found");
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::Internal("disk exploded".to_string());
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");

        let err = AppError::Storage("bucket unreachable".to_string());
        assert!(err.is_sensitive());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(anyhow::anyhow!("root cause").context("outer"));
        assert!(err.detailed_message().contains("Caused by"));
        assert_eq!(err.error_type(), "Internal");
    }
}
