use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to API callers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadInput(String),

    #[error("LTM host service not found for account: {0}")]
    HostNotFound(String),

    #[error("client-ssl profile {0} not found")]
    ProfileNotFound(String),

    #[error("{message} (host: {host}, profile: {profile})")]
    Upstream {
        host: String,
        profile: String,
        message: String,
    },
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("'{0}' cannot be empty in the configuration")]
    Missing(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// JSON error body: `{"error": "<kind>", "message": "<text>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn upstream(host: &str, profile: &str, message: impl Into<String>) -> Self {
        ApiError::Upstream {
            host: host.to_string(),
            profile: profile.to_string(),
            message: message.into(),
        }
    }

    /// Map to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadInput(_) => StatusCode::BAD_REQUEST,
            ApiError::HostNotFound(_) | ApiError::ProfileNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadInput(_) => "bad_request",
            ApiError::HostNotFound(_) | ApiError::ProfileNotFound(_) => "not_found",
            ApiError::Upstream { .. } => "upstream_error",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        }
    }
}
