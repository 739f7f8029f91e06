//! Error types for the knxrename-rs library.
//!
//! Every fallible operation returns [`Result<T>`]. Callers that need to branch on
//! the failure cause match on [`KnxError::kind`] instead of on individual variants.

use std::io;
use std::path::Path;

use thiserror::Error;

/// Main result type for knxrename operations.
pub type Result<T> = std::result::Result<T, KnxError>;

/// Coarse failure classification shared by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file, directory or document element does not exist
    NotFound,
    /// The process may not read or write the target
    PermissionDenied,
    /// Input exists but cannot be understood (bad XML, bad config, bad label)
    Malformed,
    /// A remote collaborator (the translation service) failed
    Transport,
    /// The request is valid but not something this tool handles
    Unsupported,
}

/// Error type for all knxrename operations.
#[derive(Error, Debug)]
pub enum KnxError {
    /// I/O related errors (file operations)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// XML document could not be parsed or is missing required structure
    #[error("Malformed document {document}: {message}")]
    Malformed {
        /// Document path or logical name
        document: String,
        /// Error description
        message: String,
    },

    /// A single label could not be normalized
    #[error("Failed to format label '{input}': {message}")]
    Format {
        /// The label as it was handed to the formatter
        input: String,
        /// Inner cause
        message: String,
    },

    /// Translation service errors (auth, transport, bad response)
    #[error("Translation error: {message}")]
    Translation {
        /// Error description
        message: String,
        /// HTTP status, when the service answered
        status: Option<u16>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Unsupported operation or input
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error description
        message: String,
    },
}

impl KnxError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a not-found I/O error for a path
    pub fn not_found(path: &Path) -> Self {
        Self::io(
            format!("Path does not exist: {}", path.display()),
            io::Error::new(io::ErrorKind::NotFound, "Path not found"),
        )
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new malformed-document error
    pub fn malformed(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Create a new label formatting error
    pub fn format(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a new translation error
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
            status: None,
        }
    }

    /// Create a translation error carrying the HTTP status of the response
    pub fn translation_status(message: impl Into<String>, status: u16) -> Self {
        Self::Translation {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => ErrorKind::NotFound,
                io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
                io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ErrorKind::Malformed,
                _ => ErrorKind::Unsupported,
            },
            Self::Translation { status, .. } => match status {
                Some(401 | 403) => ErrorKind::PermissionDenied,
                _ => ErrorKind::Transport,
            },
            Self::Config { .. }
            | Self::Malformed { .. }
            | Self::Format { .. }
            | Self::Serialization { .. }
            | Self::Validation { .. } => ErrorKind::Malformed,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Io { message, .. }
            | Self::Config { message, .. }
            | Self::Malformed { message, .. }
            | Self::Translation { message, .. }
            | Self::Serialization { message, .. }
            | Self::Validation { message, .. }
            | Self::Unsupported { message } => {
                *message = format!("{}: {}", context.into(), message);
            }
            Self::Format { .. } => {} // input and cause already identify the label
        }
        self
    }
}

impl From<io::Error> for KnxError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<quick_xml::Error> for KnxError {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io_err) => Self::Io {
                message: "XML I/O failed".to_string(),
                source: io::Error::new(io_err.kind(), io_err.to_string()),
            },
            other => Self::malformed("<xml>", other.to_string()),
        }
    }
}

impl From<serde_json::Error> for KnxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for KnxError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<reqwest::Error> for KnxError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::translation_status(err.to_string(), status.as_u16()),
            None => Self::translation(err.to_string()),
        }
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<KnxError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
