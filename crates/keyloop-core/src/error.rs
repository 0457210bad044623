//! Error taxonomy for the gateway pipeline

use thiserror::Error;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced by any stage of the forwarding pipeline.
///
/// Every variant maps to exactly one local HTTP status; see
/// [`GatewayError::status_code`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad or missing local input, rejected before any upstream call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Token acquisition failed
    #[error("Authentication with upstream failed: {0}")]
    Auth(#[from] AuthError),

    /// Upstream answered 401
    #[error("Upstream rejected the bearer token")]
    Unauthorized,

    /// Upstream answered 404, optionally with its message
    #[error("Not found{}", .0.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    NotFound(Option<String>),

    /// Any other non-2xx upstream answer
    #[error("Upstream request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Local parse or merge failure
    #[error("Processing failed: {0}")]
    Processing(#[from] ProcessingError),

    /// Unexpected fault
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures while exchanging client credentials for a bearer token
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Token endpoint returned a non-2xx status
    #[error("token endpoint rejected credentials with status {status}: {body}")]
    UpstreamRejected { status: u16, body: String },

    /// Token endpoint returned 2xx but no usable `access_token`
    #[error("malformed token response: {0}")]
    MalformedTokenResponse(String),

    /// Token endpoint could not be reached
    #[error("token request failed: {0}")]
    Transport(String),
}

/// Local failures after the upstream answered
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessingError {
    /// A 2xx body could not be decoded into the expected shape
    #[error("malformed upstream body: {0}")]
    MalformedBody(String),

    /// A price/availability lookup failed; the whole search is rejected
    #[error("price/availability enrichment failed for part {part_id}: {reason}")]
    EnrichmentFailed { part_id: String, reason: String },
}

impl GatewayError {
    /// Shorthand for an upstream error with status and body text
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Shorthand for a malformed-body processing error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Processing(ProcessingError::MalformedBody(reason.into()))
    }

    /// Returns the local HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Validation(_) => 400,
            GatewayError::Auth(_) => 502,
            GatewayError::Unauthorized => 401,
            GatewayError::NotFound(_) => 404,
            // Only error statuses pass through; anything else is not a
            // meaningful answer to the local caller.
            GatewayError::Upstream { status, .. } if (400..=599).contains(status) => *status,
            GatewayError::Upstream { .. } => 502,
            GatewayError::Processing(_) => 500,
            GatewayError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GatewayError::Validation("x".into()).status_code(), 400);
        assert_eq!(GatewayError::Unauthorized.status_code(), 401);
        assert_eq!(GatewayError::NotFound(None).status_code(), 404);
        assert_eq!(GatewayError::upstream(503, "down").status_code(), 503);
        assert_eq!(GatewayError::upstream(418, "teapot").status_code(), 418);
        assert_eq!(GatewayError::upstream(302, "moved").status_code(), 502);
        assert_eq!(GatewayError::malformed("eof").status_code(), 500);
        assert_eq!(GatewayError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(GatewayError::NotFound(None).to_string(), "Not found");
        assert_eq!(
            GatewayError::NotFound(Some("No parts found.".into())).to_string(),
            "Not found: No parts found."
        );
    }

    #[test]
    fn test_enrichment_failure_is_processing_error() {
        let err: GatewayError = ProcessingError::EnrichmentFailed {
            part_id: "P1".into(),
            reason: "status 500".into(),
        }
        .into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("P1"));
    }
}
