//! Error types for event translation and dispatch.

use lambda_http::http::{self, StatusCode};
use thiserror::Error;

/// Result type used across the translator.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Everything that can go wrong between a platform event and a platform response.
///
/// None of these escape [`crate::ProxyHandler::handle`]: each variant maps to
/// an HTTP status through [`ProxyError::status_code`]. Applications can also
/// return these from a [`crate::Dispatcher`] to pick the status themselves.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The event JSON does not match any known event shape.
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("invalid http method: {0}")]
    InvalidMethod(String),

    #[error("invalid request uri: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    /// `isBase64Encoded` was set but the body is not valid base64.
    #[error("invalid base64 body: {0}")]
    InvalidBody(#[from] base64::DecodeError),

    /// Raised by applications for missing or malformed input.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Reading a static file failed after it was resolved.
    #[error("static file error: {0}")]
    StaticFile(#[from] std::io::Error),

    #[error("response build error: {0}")]
    Response(#[from] http::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// HTTP status reported to the caller for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidEvent(_)
            | ProxyError::InvalidMethod(_)
            | ProxyError::InvalidUri(_)
            | ProxyError::InvalidBody(_)
            | ProxyError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::StaticFile(e) if e.kind() == std::io::ErrorKind::NotFound => {
                StatusCode::NOT_FOUND
            }
            ProxyError::StaticFile(_) | ProxyError::Response(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to put in a response body. Server-side details stay in the logs.
    pub fn public_message(&self) -> String {
        let status = self.status_code();
        if status.is_server_error() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        }
    }
}
