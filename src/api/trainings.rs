use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use std::collections::HashMap;
use uuid::Uuid;

use super::errors::ApiError;
use super::routes::AppState;
use crate::identity::{device_cookie, DeviceToken};
use crate::models::TrainingResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trainings))
        .route("/available", get(available_trainings))
        .route("/user", get(user_trainings))
        .route("/:id", get(show_training))
}

/// Map of training id to the caller's active booking id.
async fn active_booking_map(
    state: &AppState,
    device_token: &str,
) -> Result<HashMap<Uuid, Uuid>, ApiError> {
    let bookings = state
        .booking_service
        .find_active_by_device_token(device_token)
        .await?;

    Ok(bookings
        .into_iter()
        .map(|booking| (booking.training_id, booking.id))
        .collect())
}

/// All upcoming trainings, annotated with the caller's booking state.
pub async fn list_trainings(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Vec<TrainingResponse>>), ApiError> {
    let trainings = state.training_service.find_upcoming().await?;
    let bookings = active_booking_map(&state, device.as_str()).await?;

    let result = trainings
        .iter()
        .map(|training| {
            TrainingResponse::from_training(training, bookings.get(&training.id).copied())
        })
        .collect();

    Ok((jar.add(device_cookie(device.as_str())), Json(result)))
}

/// Upcoming trainings that still have free seats.
pub async fn available_trainings(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Vec<TrainingResponse>>), ApiError> {
    let trainings = state.training_service.find_available().await?;

    let result = trainings
        .iter()
        .map(|training| TrainingResponse::from_training(training, None))
        .collect();

    Ok((jar.add(device_cookie(device.as_str())), Json(result)))
}

/// Trainings the calling device holds an active booking for.
pub async fn user_trainings(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Vec<TrainingResponse>>), ApiError> {
    let bookings = state
        .booking_service
        .find_active_by_device_token(device.as_str())
        .await?;

    let mut result = Vec::with_capacity(bookings.len());
    for booking in &bookings {
        if let Some(training) = state.training_service.find_by_id(booking.training_id).await? {
            result.push(TrainingResponse::from_training(&training, Some(booking.id)));
        }
    }

    Ok((jar.add(device_cookie(device.as_str())), Json(result)))
}

pub async fn show_training(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
    Path(training_id): Path<Uuid>,
) -> Result<(CookieJar, Json<TrainingResponse>), ApiError> {
    let training = state
        .training_service
        .find_by_id(training_id)
        .await?
        .ok_or(ApiError::TrainingNotFound)?;

    let bookings = active_booking_map(&state, device.as_str()).await?;
    let response = TrainingResponse::from_training(&training, bookings.get(&training.id).copied());

    Ok((jar.add(device_cookie(device.as_str())), Json(response)))
}
