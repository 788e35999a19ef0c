//! Error types module
//!
//! `AppError` is the taxonomy surfaced to callers of the ingestion and signing entry points.
//! Storage backends keep their own error type and are mapped into `AppError` at the service
//! boundary.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a single failed transfer
    Warn,
    /// Error level - for failures that abort the whole operation
    Error,
}

/// Metadata describing how an error should be reported to an operator.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONFIGURATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the failing operation can be retried as-is
    fn is_recoverable(&self) -> bool;

    /// Suggested remediation for the operator
    fn suggested_action(&self) -> Option<&'static str>;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Reasons a signed URL is refused. Always an access denial, never a server fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Malformed signed URL: {0}")]
    Malformed(String),

    #[error("Signature does not match")]
    InvalidSignature,

    #[error("Signed URL expired at {expires} (now {now})")]
    Expired { expires: u64, now: u64 },
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transfer error: {0}")]
    Transfer(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Verification(#[from] VerificationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Transfer(_) => "TRANSFER_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Verification(_) => "VERIFICATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Transfer(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Configuration(_) => Some(
                "Check S3_BUCKET, S3_ENDPOINT/R2_ACCOUNT_ID and the access key pair, then retry",
            ),
            AppError::Transfer(_) => {
                Some("Re-run the batch; objects already stored are skipped")
            }
            AppError::InvalidInput(_) => Some("Fix the arguments and retry"),
            AppError::NotFound(_) => Some("Check that the local path exists"),
            AppError::Verification(_) => Some("Request a fresh signed URL"),
            AppError::Internal(_) => None,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::NotFound(_) | AppError::Verification(_) => {
                LogLevel::Debug
            }
            AppError::Transfer(_) => LogLevel::Warn,
            AppError::Configuration(_) | AppError::Internal(_) => LogLevel::Error,
        }
    }
}
