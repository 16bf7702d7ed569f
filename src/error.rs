//! Error types for the cache facade
//!
//! Provides the domain error taxonomy, the structured backend errors it is
//! translated from, and connection setup errors, all using thiserror.

use std::fmt;

use thiserror::Error;

// == Cache Error Enum ==
/// Domain error returned by the write paths of the facade.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or longer than the maximum key length
    #[error("invalid key")]
    InvalidKey,

    /// Value has zero length
    #[error("empty body")]
    EmptyBody,

    /// Value exceeds the maximum size, or the backend rejected it as too large
    #[error("oversized body")]
    OversizedBody,

    /// Key is absent, or the backend refused to store the document
    #[error("not found")]
    NotFound,

    /// Any other backend failure, passed through unchanged
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// == Backend Error Kind ==
/// Structured failure categories a backend session can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The key does not exist
    KeyNotFound,
    /// A document with a conflicting CAS already exists
    KeyExists,
    /// The document value is larger than the backend accepts
    ValueTooLarge,
    /// The backend rejected the request arguments
    InvalidArguments,
    /// The document could not be stored
    NotStored,
    /// Credentials were rejected
    AuthFailed,
    /// The backend does not understand the command
    UnknownCommand,
    /// The backend asked the client to retry later
    TemporaryFailure,
    /// Any other status code reported by the backend
    Status(u16),
    /// Transport failure talking to the backend
    Io,
    /// The backend sent a response that could not be understood
    Protocol,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendErrorKind::KeyNotFound => f.write_str("key not found"),
            BackendErrorKind::KeyExists => f.write_str("key exists"),
            BackendErrorKind::ValueTooLarge => f.write_str("value too large"),
            BackendErrorKind::InvalidArguments => f.write_str("invalid arguments"),
            BackendErrorKind::NotStored => f.write_str("not stored"),
            BackendErrorKind::AuthFailed => f.write_str("authentication failed"),
            BackendErrorKind::UnknownCommand => f.write_str("unknown command"),
            BackendErrorKind::TemporaryFailure => f.write_str("temporary failure"),
            BackendErrorKind::Status(code) => write!(f, "status 0x{:04x}", code),
            BackendErrorKind::Io => f.write_str("i/o error"),
            BackendErrorKind::Protocol => f.write_str("protocol error"),
        }
    }
}

// == Backend Error ==
/// Error reported by a [`CacheSession`](crate::session::CacheSession).
#[derive(Error, Debug)]
#[error("{kind}: {message}")]
pub struct BackendError {
    kind: BackendErrorKind,
    message: String,
}

impl BackendError {
    /// Creates a new BackendError with a category and a human-readable message.
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`BackendErrorKind::KeyNotFound`] error.
    pub fn key_not_found(key: &str) -> Self {
        Self::new(BackendErrorKind::KeyNotFound, format!("key '{}'", key))
    }

    /// Returns the structured category of this error.
    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    /// Returns the backend's message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::new(BackendErrorKind::Io, err.to_string())
    }
}

// == Connect Error ==
/// Failure while establishing a session. Reported as-is, never translated.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The transport connection could not be established
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The bucket could not be opened with the given credentials
    #[error("failed to open bucket '{bucket}': {source}")]
    OpenBucket {
        bucket: String,
        #[source]
        source: BackendError,
    },
}

// == Result Type Alias ==
/// Convenience Result type for facade operations.
pub type Result<T> = std::result::Result<T, CacheError>;
