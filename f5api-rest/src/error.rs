use axum::Json;
use axum::response::{IntoResponse, Response};
use f5api_core::ApiError;
use tracing::warn;

/// [`ApiError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        warn!(status = status.as_u16(), kind = self.0.kind(), error = %self.0, "request failed");
        (status, Json(self.0.to_body())).into_response()
    }
}
