//! Upstream response interpretation

use keyloop_core::json::from_upstream_slice;
use keyloop_core::{GatewayError, GatewayResult, ProcessingError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Outcome of one upstream call, before it is turned into a local result
#[derive(Debug, PartialEq)]
pub enum Mapped<T> {
    /// 2xx with a body that decoded
    Success(T),
    /// 404, with the upstream message when there was one
    NotFound(Option<String>),
    /// 401
    Unauthorized,
    /// Any other non-2xx
    UpstreamError { status: u16, body: String },
    /// 2xx whose body did not decode
    ProcessingError(ProcessingError),
}

impl<T> Mapped<T> {
    pub fn into_result(self) -> GatewayResult<T> {
        match self {
            Mapped::Success(value) => Ok(value),
            Mapped::NotFound(message) => Err(GatewayError::NotFound(message)),
            Mapped::Unauthorized => Err(GatewayError::Unauthorized),
            Mapped::UpstreamError { status, body } => Err(GatewayError::Upstream { status, body }),
            Mapped::ProcessingError(e) => Err(GatewayError::Processing(e)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Mapped::Unauthorized)
    }
}

/// Map an upstream status and body onto a [`Mapped`] outcome
pub fn map_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Mapped<T> {
    if status.is_success() {
        return match from_upstream_slice(body) {
            Ok(value) => Mapped::Success(value),
            Err(e) => Mapped::ProcessingError(ProcessingError::MalformedBody(e.to_string())),
        };
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    match status {
        StatusCode::NOT_FOUND => Mapped::NotFound(if text.is_empty() { None } else { Some(text) }),
        StatusCode::UNAUTHORIZED => Mapped::Unauthorized,
        _ => Mapped::UpstreamError {
            status: status.as_u16(),
            body: text,
        },
    }
}
