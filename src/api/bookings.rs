use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use super::errors::ApiError;
use super::routes::AppState;
use crate::identity::{device_cookie, DeviceToken};
use crate::models::{BookingHistoryEntry, BookingResponse, CreateBookingRequest, Training};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/history", get(booking_history))
        .route("/:id", delete(cancel_booking))
}

/// Reserve a seat. Also refreshes the device's saved profile so the next
/// booking form can be prefilled, and sends the confirmation email off the
/// request path.
pub async fn create_booking(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, CookieJar, Json<BookingResponse>), ApiError> {
    let training_id = request.training_id.ok_or(ApiError::TrainingNotFound)?;
    let training = state
        .training_service
        .find_by_id(training_id)
        .await?
        .ok_or(ApiError::TrainingNotFound)?;

    let booking = state
        .booking_service
        .create(&training, &request, device.as_str())
        .await?;

    state
        .user_session_service
        .save_profile(
            device.as_str(),
            &request.full_name,
            &request.email,
            &request.phone,
        )
        .await?;

    let email_service = state.email_service.clone();
    let email_booking = booking.clone();
    tokio::spawn(async move {
        if let Err(e) = email_service
            .send_booking_confirmation(&email_booking, &training)
            .await
        {
            warn!("Failed to send confirmation email for booking {}: {}", email_booking.id, e);
        }
    });

    Ok((
        StatusCode::CREATED,
        jar.add(device_cookie(device.as_str())),
        Json(BookingResponse::from(&booking)),
    ))
}

/// Cancel a booking owned by the calling device.
pub async fn cancel_booking(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
    Path(booking_id): Path<Uuid>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let booking = state
        .booking_service
        .cancel(booking_id, device.as_str())
        .await?;

    if let Some(training) = state.training_service.find_by_id(booking.training_id).await? {
        let email_service = state.email_service.clone();
        let email_booking = booking.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_booking_cancellation(&email_booking, &training)
                .await
            {
                warn!(
                    "Failed to send cancellation email for booking {}: {}",
                    email_booking.id, e
                );
            }
        });
    }

    Ok((
        jar.add(device_cookie(device.as_str())),
        Json(json!({ "success": true })),
    ))
}

/// Full booking history for the calling device, newest first.
pub async fn booking_history(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Vec<BookingHistoryEntry>>), ApiError> {
    let bookings = state
        .booking_service
        .find_history_by_device_token(device.as_str())
        .await?;

    let mut trainings: HashMap<Uuid, Training> = HashMap::new();
    let mut result = Vec::with_capacity(bookings.len());

    for booking in &bookings {
        if !trainings.contains_key(&booking.training_id) {
            if let Some(training) = state.training_service.find_by_id(booking.training_id).await? {
                trainings.insert(booking.training_id, training);
            }
        }

        if let Some(training) = trainings.get(&booking.training_id) {
            result.push(BookingHistoryEntry::new(booking, training));
        }
    }

    Ok((jar.add(device_cookie(device.as_str())), Json(result)))
}
