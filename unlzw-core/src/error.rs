//! Error types for unlzw operations.
//!
//! Every failure carries a classification ([`ErrorKind`]) and a short
//! diagnostic string. Errors are cheap to clone so that a decoder can keep the
//! first one it hits and hand it back on every later call.

use std::io;
use thiserror::Error;

/// Classification of a decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Header magic or structure is invalid for the selected dialect.
    Format,
    /// The code stream is inconsistent with the dictionary.
    Protocol,
    /// Dialect or configuration not supported.
    NotImplemented,
    /// The output sink did not accept a full write.
    Sink,
    /// Reading the compressed input failed.
    Io,
}

/// The main error type for unlzw operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LzwError {
    /// Invalid header for the selected dialect.
    #[error("Format error: {message}")]
    Format {
        /// Description of the header problem.
        message: String,
    },

    /// Corrupt or out-of-range code stream.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the violation.
        message: String,
    },

    /// Unsupported dialect or configuration.
    #[error("Not implemented: {message}")]
    NotImplemented {
        /// What was requested.
        message: String,
    },

    /// The output sink rejected or shortened a write.
    #[error("Sink error: {message}")]
    Sink {
        /// Description of the sink failure.
        message: String,
    },

    /// The input reader failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the read failure.
        message: String,
    },
}

/// Result type alias for unlzw operations.
pub type Result<T> = std::result::Result<T, LzwError>;

impl LzwError {
    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a not-implemented error.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented {
            message: message.into(),
        }
    }

    /// Create a sink error.
    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink {
            message: message.into(),
        }
    }

    /// Create an input I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Format { .. } => ErrorKind::Format,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::Sink { .. } => ErrorKind::Sink,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// The diagnostic string, without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Format { message }
            | Self::Protocol { message }
            | Self::NotImplemented { message }
            | Self::Sink { message }
            | Self::Io { message } => message,
        }
    }
}

impl From<io::Error> for LzwError {
    fn from(err: io::Error) -> Self {
        Self::io(err.to_string())
    }
}
