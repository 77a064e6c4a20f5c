//! Mapping of refinement failures onto HTTP responses.

use api_shared::ErrorRes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use refiner_core::RefinerError;

/// A failed refinement, rendered as an [`ErrorRes`] body.
#[derive(Debug)]
pub struct ApiError(pub RefinerError);

impl ApiError {
    /// HTTP status for each failure mode.
    ///
    /// Caller mistakes are 4xx, failures of the Reference Lookup Service or answers we cannot
    /// translate are 502, and anything else is ours (500).
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RefinerError::Document(_) | RefinerError::InvalidCondition(_) => {
                StatusCode::BAD_REQUEST
            }
            RefinerError::InvalidSection(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RefinerError::Resolution { .. }
            | RefinerError::UnsupportedSystem(_)
            | RefinerError::MalformedReference { .. } => StatusCode::BAD_GATEWAY,
            RefinerError::Serialise(_) | RefinerError::InvalidConfig(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<RefinerError> for ApiError {
    fn from(err: RefinerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();

        if status.is_server_error() {
            tracing::error!(error = %self.0, kind, "refinement failed");
        } else {
            tracing::info!(error = %self.0, kind, "rejected refinement request");
        }

        // Internal details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal error".to_owned()
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(ErrorRes {
                error: kind.to_owned(),
                message,
            }),
        )
            .into_response()
    }
}
