//! Error types for client construction

use keyloop_core::AuthError;
use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while building a [`crate::KeyloopClient`].
///
/// Per-request failures are reported as [`keyloop_core::GatewayError`].
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Initial token acquisition failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
