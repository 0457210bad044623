//! API error types and conversions

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyloop_core::GatewayError;
use serde::Serialize;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request
    BadRequest(String),
    /// 401 Unauthorized (upstream rejected our token)
    Unauthorized(String),
    /// 404 Not Found
    NotFound(String),
    /// Upstream error status, passed through
    Upstream { status: StatusCode, message: String },
    /// 500 from a parse or enrichment failure
    Processing(String),
    /// 502 Bad Gateway (token exchange failed, or upstream sent a non-error status)
    BadGateway(String),
    /// 500 Internal Server Error
    Internal(String),
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Upstream { status, message } => (status, "upstream_error", message),
            ApiError::Processing(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "processing_error", msg)
            }
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(error = error_type, status = status.as_u16(), %message, "API error");
        } else if status.is_client_error() {
            tracing::debug!(error = error_type, status = status.as_u16(), %message, "API client error");
        }

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = err.status_code();
        match err {
            GatewayError::Validation(msg) => ApiError::BadRequest(msg),
            GatewayError::Auth(e) => ApiError::BadGateway(e.to_string()),
            GatewayError::Unauthorized => {
                ApiError::Unauthorized("Upstream rejected the access token".to_string())
            }
            GatewayError::NotFound(msg) => {
                ApiError::NotFound(msg.unwrap_or_else(|| "Resource not found".to_string()))
            }
            GatewayError::Upstream { status: upstream, body } => {
                let message = if body.is_empty() {
                    format!("Upstream returned status {}", upstream)
                } else {
                    body
                };
                // Non-error upstream statuses are not passed through
                match StatusCode::from_u16(status) {
                    Ok(code) if status == upstream => ApiError::Upstream {
                        status: code,
                        message,
                    },
                    _ => ApiError::BadGateway(message),
                }
            }
            GatewayError::Processing(e) => ApiError::Processing(e.to_string()),
            GatewayError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyloop_core::{AuthError, ProcessingError};

    fn status_of(err: GatewayError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_gateway_error_statuses() {
        assert_eq!(
            status_of(GatewayError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(GatewayError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(GatewayError::NotFound(None)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(GatewayError::upstream(503, "down")),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(GatewayError::upstream(302, "moved")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(GatewayError::Auth(AuthError::Transport("refused".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ProcessingError::MalformedBody("eof".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(GatewayError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            ApiError::from(GatewayError::upstream(502, "bad")),
            ApiError::Upstream { .. }
        ));
        assert!(matches!(
            ApiError::from(GatewayError::upstream(301, "")),
            ApiError::BadGateway(msg) if msg == "Upstream returned status 301"
        ));
        assert!(matches!(
            ApiError::from(GatewayError::NotFound(Some("No parts found.".into()))),
            ApiError::NotFound(msg) if msg == "No parts found."
        ));
    }
}
