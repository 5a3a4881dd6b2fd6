//! Error handling for domain directory operations.
//!
//! This module defines a comprehensive error type that covers all the different
//! ways directory maintenance can fail, from malformed input files to store I/O.

use std::fmt;

/// Main error type for domain directory operations.
///
/// This enum covers all possible failure modes in the import/enrichment
/// pipeline, providing detailed context for debugging and user-friendly
/// error messages. Per-row import problems are NOT errors; they are
/// collected into [`crate::ImportReport`]; this type is for failures that
/// stop an operation.
#[derive(Debug, Clone)]
pub enum DirectoryError {
    /// Invalid domain name (failed normalization)
    InvalidDomain {
        domain: String,
        reason: String,
    },

    /// File I/O errors when reading import files or the store file
    FileError {
        path: String,
        message: String,
    },

    /// Input could not be parsed in the expected format
    ParseError {
        message: String,
        context: Option<String>,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError {
        message: String,
    },

    /// WHOIS lookup failures that are not per-record outcomes
    LookupError {
        domain: String,
        message: String,
    },

    /// Timeout errors when operations take too long
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl DirectoryError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
            context: None,
        }
    }

    /// Create a new parse error with the offending input attached.
    pub fn parse_with_context<M: Into<String>, C: Into<String>>(message: M, context: C) -> Self {
        Self::ParseError {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new lookup error.
    pub fn lookup<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::LookupError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error suggests the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LookupError { .. } | Self::Timeout { .. })
    }
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ParseError { message, context } => {
                if let Some(context) = context {
                    write!(f, "Parse error: {} (input: {})", message, context)
                } else {
                    write!(f, "Parse error: {}", message)
                }
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::LookupError { domain, message } => {
                write!(f, "WHOIS lookup error for '{}': {}", domain, message)
            }
            Self::Timeout { operation, duration } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DirectoryError {}

// Implement From conversions for common error types
impl From<std::io::Error> for DirectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
            context: None,
        }
    }
}

impl From<csv::Error> for DirectoryError {
    fn from(err: csv::Error) -> Self {
        Self::ParseError {
            message: format!("CSV parsing failed: {}", err),
            context: None,
        }
    }
}

impl From<zip::result::ZipError> for DirectoryError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ParseError {
            message: format!("XLSX archive error: {}", err),
            context: None,
        }
    }
}

impl From<regex::Error> for DirectoryError {
    fn from(err: regex::Error) -> Self {
        Self::Internal {
            message: format!("Regex error: {}", err),
        }
    }
}
