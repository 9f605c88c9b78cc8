use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use leavesync_core::SyncError;

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

/// Wraps `SyncError` so it can be returned directly from an axum handler.
/// The status mapping follows the failure taxonomy: auth failures are not
/// the caller's fault to retry (401), upstream outages are (503), a busy
/// sync lock is a normal contention signal (409), and a malformed window
/// is the caller's mistake (400).
pub struct ApiError(pub SyncError);

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SyncError::AuthError { .. } => StatusCode::UNAUTHORIZED,
            SyncError::ApiError { .. } => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::RateLimitError { .. } => StatusCode::TOO_MANY_REQUESTS,
            SyncError::TransformError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::CryptoError(_) => StatusCode::BAD_REQUEST,
            SyncError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SyncError::LockBusy => StatusCode::CONFLICT,
            SyncError::Throttled(_) => StatusCode::TOO_MANY_REQUESTS,
            SyncError::RangeError(_) => StatusCode::BAD_REQUEST,
            SyncError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
