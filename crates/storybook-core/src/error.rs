//! Error types module
//!
//! All storefront failures are unified under the `AppError` enum. The variants mirror
//! how the UI is expected to react: validation errors stay local and block submission,
//! authorization errors may trigger the guest fallback, server and transport errors
//! are surfaced with the server-provided message, and state inconsistencies send the
//! user back to re-enter their data.

use std::fmt;

/// Message shown when the server gives no usable error text.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues surfaced to the user
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for presenting an error to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same action can succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Client-side validation failure. Never reaches the network layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("File is too large ({actual_size_mb:.2} MB)")]
    FileTooLarge { actual_size_mb: f64 },

    #[error("Unsupported file type: {content_type}")]
    UnsupportedFileType { content_type: String },

    #[error("Invalid photo URL: {0}")]
    InvalidPhotoUrl(String),

    #[error("{field}: {message}")]
    Field {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::Field {
            field,
            message: message.into(),
        }
    }

    /// Stable reason tag, e.g. `"file-too-large"`.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::FileTooLarge { .. } => "file-too-large",
            ValidationError::UnsupportedFileType { .. } => "unsupported-file-type",
            ValidationError::InvalidPhotoUrl(_) => "invalid-photo-url",
            ValidationError::Field { .. } => "invalid-field",
        }
    }

    /// Form field this error should be shown next to.
    pub fn field_name(&self) -> &'static str {
        match self {
            ValidationError::FileTooLarge { .. }
            | ValidationError::UnsupportedFileType { .. }
            | ValidationError::InvalidPhotoUrl(_) => "childPhotoUrl",
            ValidationError::Field { field, .. } => field,
        }
    }
}

/// Every inline error produced by one form validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// First error for a given field, if any.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field_name() == field)
    }

    /// Turn the collection into a result: `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors(vec![err])
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Inconsistent wizard state: {0}")]
    StateInconsistency(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Another operation is in progress: {0}")]
    Busy(&'static str),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.into())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(format!("JSON parsing error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Correct the highlighted fields and try again"),
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            "UNAUTHORIZED",
            false,
            Some("Sign in again to continue"),
            LogLevel::Debug,
        ),
        AppError::Server { status, .. } if *status >= 500 => (
            "SERVER_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Warn,
        ),
        AppError::Server { .. } => (
            "REQUEST_REJECTED",
            true,
            Some("Check your information and try again"),
            LogLevel::Warn,
        ),
        AppError::Transport(_) => (
            "NETWORK_ERROR",
            true,
            Some("Check your connection and retry"),
            LogLevel::Warn,
        ),
        AppError::Decode(_) => (
            "INVALID_RESPONSE",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::StateInconsistency(_) => (
            "STATE_INCONSISTENCY",
            false,
            Some("Re-enter the child's information"),
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Busy(_) => (
            "BUSY",
            true,
            Some("Wait for the current action to finish"),
            LogLevel::Debug,
        ),
    }
}

impl AppError {
    /// Build a server error, keeping the server-provided message when there is one.
    pub fn server(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
        AppError::Server { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }

    /// Whether this error came back from the network layer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            AppError::Unauthorized(_)
                | AppError::Server { .. }
                | AppError::Transport(_)
                | AppError::Decode(_)
        )
    }

    /// Get the error type name
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Server { .. } => "Server",
            AppError::Transport(_) => "Transport",
            AppError::Decode(_) => "Decode",
            AppError::StateInconsistency(_) => "StateInconsistency",
            AppError::Storage(_) => "Storage",
            AppError::Busy(_) => "Busy",
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref errors) => errors.to_string(),
            AppError::Unauthorized(ref msg) if !msg.is_empty() => msg.clone(),
            AppError::Unauthorized(_) => "Your session has expired".to_string(),
            AppError::Server { ref message, .. } => message.clone(),
            AppError::Transport(_) => "Could not reach the server".to_string(),
            AppError::Decode(_) => GENERIC_ERROR_MESSAGE.to_string(),
            AppError::StateInconsistency(_) => {
                "Please enter the child's information again".to_string()
            }
            AppError::Storage(_) => "Could not save your progress locally".to_string(),
            AppError::Busy(op) => format!("Please wait: {} is still in progress", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_reason() {
        let err = ValidationError::FileTooLarge {
            actual_size_mb: 10.5,
        };
        assert_eq!(err.reason(), "file-too-large");
        assert_eq!(err.field_name(), "childPhotoUrl");
        assert!(err.to_string().contains("10.50"));
    }

    #[test]
    fn test_server_error_falls_back_to_generic_message() {
        let err = AppError::server(500, Some("   ".to_string()));
        assert_eq!(err.client_message(), GENERIC_ERROR_MESSAGE);

        let err = AppError::server(422, Some("Book is unavailable".to_string()));
        assert_eq!(err.client_message(), "Book is unavailable");
        assert_eq!(err.error_code(), "REQUEST_REJECTED");
    }

    #[test]
    fn test_error_metadata_server_error() {
        let err = AppError::server(503, None);
        assert_eq!(err.error_code(), "SERVER_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.is_network());
    }

    #[test]
    fn test_error_metadata_validation() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::field("childFirstName", "Name is required"));
        errors.push(ValidationError::field("gender", "Gender is required"));
        let err = AppError::from(errors);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert!(!err.is_network());
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.client_message().contains("Name is required"));
        assert!(err.client_message().contains("Gender is required"));
    }

    #[test]
    fn test_validation_errors_for_field() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::field("childAge", "Age must be between 0 and 18"));
        assert!(errors.for_field("childAge").is_some());
        assert!(errors.for_field("gender").is_none());
        assert!(errors.clone().into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        let err = AppError::StateInconsistency("no form data".to_string());
        assert_eq!(
            err.suggested_action(),
            Some("Re-enter the child's information")
        );
        assert!(AppError::Unauthorized(String::new()).is_unauthorized());
        assert_eq!(
            AppError::Unauthorized(String::new()).client_message(),
            "Your session has expired"
        );
    }
}
