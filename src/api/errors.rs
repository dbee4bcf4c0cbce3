use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Training not found")]
    TrainingNotFound,
    #[error("Booking not found")]
    BookingNotFound,
    #[error("No available slots")]
    NoSlotsAvailable,
    #[error("You already have a booking for this training")]
    DuplicateBooking,
    #[error("Booking is already cancelled")]
    AlreadyCancelled,
    #[error("Access denied")]
    AccessDenied,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                let mut messages = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    if let Some(error) = field_errors.first() {
                        let message = error
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| error.code.to_string());
                        messages.insert(field.to_string(), json!(message));
                    }
                }

                (StatusCode::BAD_REQUEST, Json(json!({ "errors": messages }))).into_response()
            }
            ApiError::Database(ref error) => {
                tracing::error!("Database error: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            ApiError::Internal(ref error) => {
                tracing::error!("Internal error: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            _ => {
                let status = match self {
                    ApiError::TrainingNotFound | ApiError::BookingNotFound => {
                        StatusCode::NOT_FOUND
                    }
                    ApiError::AccessDenied => StatusCode::FORBIDDEN,
                    _ => StatusCode::BAD_REQUEST,
                };

                (status, Json(json!({ "error": self.to_string() }))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::TrainingNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BookingNotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::NoSlotsAvailable.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicateBooking.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AccessDenied.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::InvalidRequest("Invalid data provided".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
