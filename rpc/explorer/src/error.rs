use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use visor_core::error;
use visor_historydb::HistoryError;

use crate::IDENT;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("[{IDENT}]: {0}")]
    HistoryError(#[from] HistoryError),

    #[error("[{IDENT}]: blocking task failed: {0}")]
    TaskError(String),

    #[error("[{IDENT}]: http server error: {0}")]
    ServerError(#[from] std::io::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// An error answer of the explorer API.
///
/// Rendered as a plain text body `"<code> <reason>"`, followed by `" - <detail>"` when a
/// detail is present. Internal errors never expose their detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub status: StatusCode,
    pub detail: Option<String>,
}

impl HttpError {
    pub fn new(status: StatusCode, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, Some(detail.into()))
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, Some(detail.into()))
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, None)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, None)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, None)
    }

    pub fn body(&self) -> String {
        let reason = self.status.canonical_reason().unwrap_or_default();
        match &self.detail {
            Some(detail) if self.status != StatusCode::INTERNAL_SERVER_ERROR => {
                format!("{} {} - {}", self.status.as_u16(), reason, detail)
            }
            _ => format!("{} {}", self.status.as_u16(), reason),
        }
    }
}

impl From<GatewayError> for HttpError {
    fn from(err: GatewayError) -> Self {
        error!("[{0}] request failed: {1}", IDENT, err);
        Self::internal()
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, self.body()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_body() {
        assert_eq!(HttpError::bad_request("address is empty").body(), "400 Bad Request - address is empty");
        assert_eq!(HttpError::not_found().body(), "404 Not Found");
        assert_eq!(HttpError::method_not_allowed().body(), "405 Method Not Allowed");
        assert_eq!(HttpError::forbidden("invalid CSRF token").body(), "403 Forbidden - invalid CSRF token");

        let internal = HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, Some("disk on fire".to_string()));
        assert_eq!(internal.body(), "500 Internal Server Error");
        assert_eq!(HttpError::from(GatewayError::TaskError("panicked".to_string())), HttpError::internal());
    }
}
