//! HTTP error mapping.
//!
//! Every handler failure becomes a JSON body `{ "error": ..., "status": ... }`
//! with a 4xx status, so the dashboard can show the message as-is. That
//! includes bodies axum cannot decode, which keep the rejection's status.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::controller::ControllerError;

/// Error returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Lifecycle or validation failure from the controller
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Request body could not be decoded as JSON parameters
    #[error("invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Controller(ControllerError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Controller(ControllerError::AlreadyRunning | ControllerError::NotRunning) => {
                StatusCode::CONFLICT
            },
            Self::InvalidBody(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self, "request rejected");

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use ticketsim_core::ConfigError;

    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::from(ControllerError::Validation(ConfigError::Missing("vendors")));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn lifecycle_misuse_maps_to_conflict() {
        assert_eq!(ApiError::from(ControllerError::AlreadyRunning).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(ControllerError::NotRunning).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn display_passes_through() {
        let err = ApiError::from(ControllerError::NotRunning);
        assert_eq!(err.to_string(), "no simulation is running");
    }
}
