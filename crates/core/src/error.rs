//! Error types for dsbridge
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Wire Codes
//!
//! Every variant maps onto one of the datastore wire error codes via
//! [`Error::code`]. The host dispatcher uses that code to build its error
//! response; the core never formats wire responses itself.

use thiserror::Error;

use crate::index::IndexDefinition;

/// Result type alias for dsbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Datastore wire error code an [`Error`] is reported as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request itself is invalid (malformed key, unknown cursor, bad query)
    BadRequest,
    /// The query needs a composite index that is not registered
    NeedIndex,
    /// Something failed on our side or in the storage engine
    InternalError,
    /// A looked-up item does not exist
    NotFound,
}

impl ErrorCode {
    /// Wire name of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::NeedIndex => "NEED_INDEX",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
        }
    }
}

/// Error types for the datastore translation layer
#[derive(Debug, Error)]
pub enum Error {
    /// Key path is empty, or an element lacks both id and name
    #[error("Malformed key: {0}")]
    MalformedKey(String),

    /// A stored value carries a type discriminator outside the known vocabulary
    #[error("Unknown type tag: {0}")]
    UnknownTypeTag(String),

    /// A value or property cannot be represented in storage
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// A stored document cannot be decoded back into an entity
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// Fetch requested on a cursor that does not exist (or is exhausted)
    #[error("Cursor {0} not found")]
    CursorNotFound(u64),

    /// The query needs a composite index that has not been registered
    #[error("Query on kind '{kind}' requires a composite index that is not defined: {index}")]
    MissingRequiredIndex {
        /// Kind being queried
        kind: String,
        /// The index that would satisfy the query
        index: IndexDefinition,
    },

    /// Storage engine connectivity or execution failure
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Schema lookup on an unknown kind or property
    #[error("Not found: {0}")]
    NotFound(String),

    /// Query on a `__x__` kind that is not synthesized
    #[error("Unsupported pseudo-kind: {0}")]
    UnsupportedPseudoKind(String),

    /// Ill-formed query or request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a malformed key error
    pub fn malformed_key(msg: impl Into<String>) -> Self {
        Error::MalformedKey(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Error::InvalidValue(msg.into())
    }

    /// Create a corrupt document error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::CorruptDocument(msg.into())
    }

    /// Create a bad request error
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Error::BadRequest(msg.into())
    }

    /// Create a storage unavailable error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::StorageUnavailable(msg.into())
    }

    /// Wire code this error is reported as
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::MalformedKey(_)
            | Error::InvalidValue(_)
            | Error::CursorNotFound(_)
            | Error::UnsupportedPseudoKind(_)
            | Error::BadRequest(_) => ErrorCode::BadRequest,
            Error::MissingRequiredIndex { .. } => ErrorCode::NeedIndex,
            Error::NotFound(_) => ErrorCode::NotFound,
            Error::UnknownTypeTag(_)
            | Error::CorruptDocument(_)
            | Error::StorageUnavailable(_)
            | Error::Config(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the failure came from the storage engine
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}
