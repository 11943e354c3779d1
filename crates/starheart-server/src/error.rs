//! Mapping of story errors onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use starheart_core::StoryError;
use starheart_types::ErrorResponse;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Story(#[from] StoryError),

    #[error("invalid request body: {0}")]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Story(StoryError::SessionNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Story(StoryError::SessionAlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Story(StoryError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Story(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Story(StoryError::SessionNotFound(_)) => ErrorResponse::new("Session not found"),
            ApiError::Story(StoryError::SessionAlreadyExists(_)) => {
                ErrorResponse::new("Session already exists")
            }
            ApiError::Story(StoryError::Validation(details)) => ErrorResponse {
                message: "Invalid request".to_string(),
                details: Some(details.clone()),
            },
            ApiError::Story(e) => {
                error!(target: "starheart::api", "Storage failure: {}", e);
                ErrorResponse::new("Something went wrong")
            }
            ApiError::Body(rejection) => ErrorResponse {
                message: "Invalid request".to_string(),
                details: Some(rejection.body_text()),
            },
        };
        (status, Json(body)).into_response()
    }
}
