//! What can go wrong between this client and the session service.

use reqwest::StatusCode;
use thiserror::Error;

/// Result of a session service call.
pub type ApiResult<T> = Result<T, ApiError>;

/// A session service call that did not produce the expected document.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No service URL was configured.
    #[error("session service is not configured: set `{var}`")]
    MissingEnvVar {
        /// Variable that would have supplied the value.
        var: &'static str,
    },
    /// The HTTP client could not be set up.
    #[error("could not set up the session service client")]
    ClientBuilder {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The service could not be reached.
    #[error("could not reach the session service at `{path}`")]
    RequestSend {
        /// Request path, relative to the service root.
        path: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// The service refused the call; a 404 means the session is gone.
    #[error("session service answered {status} for `{path}`")]
    RequestStatus {
        /// Request path, relative to the service root.
        path: String,
        /// Status the service answered with.
        status: StatusCode,
    },
    /// The body was not the session or decisions document expected.
    #[error("unexpected session service payload for `{path}`")]
    DecodeResponse {
        /// Request path, relative to the service root.
        path: String,
        /// Underlying decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Status the service answered with, when it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::RequestStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
