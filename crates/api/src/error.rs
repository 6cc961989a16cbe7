//! Error responses for the host dispatcher

use dsbridge_core::{Error, ErrorCode};
use tracing::warn;

/// Wire-level error: a datastore error code plus a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Datastore error code
    pub code: ErrorCode,
    /// Human-readable detail
    pub message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        let code = error.code();
        if code == ErrorCode::InternalError {
            warn!(target: "dsbridge::api", error = %error, "Internal error");
        }
        ErrorResponse {
            code,
            message: error.to_string(),
        }
    }
}

impl From<Error> for ErrorResponse {
    fn from(error: Error) -> Self {
        ErrorResponse::from(&error)
    }
}
