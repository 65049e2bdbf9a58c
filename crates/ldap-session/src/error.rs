//! Error types for directory session operations.
//!
//! Every failure a caller can observe falls into one of three classes. Input problems are
//! reported before any network exchange and leave the session untouched. Use of a session that
//! is not connected is likewise side-effect free. Protocol failures are only ever returned after
//! the session has been torn down.

use thiserror::Error;

/// Main error type for session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed input detected before any network interaction.
    #[error("{0}")]
    Validation(String),

    /// The handle has no live session.
    #[error("Not connected.")]
    NotConnected,

    /// The directory protocol layer reported a failure; the session is gone.
    #[error("LDAP Error: {diagnostic}")]
    Protocol {
        /// Result code returned by the server, absent for transport-level failures.
        code: Option<u32>,
        /// Standard description of the failure.
        diagnostic: String,
        /// Additional diagnostic text supplied by the server, possibly empty.
        server_message: String,
    },
}

/// Specialized result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotConnected => "NOT_CONNECTED",
            Self::Protocol { .. } => "PROTOCOL_ERROR",
        }
    }

    /// Returns true if the error destroyed the session that produced it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Result code carried by a protocol error.
    #[must_use]
    pub const fn result_code(&self) -> Option<u32> {
        match self {
            Self::Protocol { code, .. } => *code,
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Validation(format!("Invalid URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(format!("Invalid configuration: {err}"))
    }
}
