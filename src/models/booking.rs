use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Training, TrainingSummary};

/// A seat reservation for a training, owned by a device token.
///
/// Bookings are never hard-deleted; cancellation flips the status.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub training_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub confirmation_token: String,
    pub device_token: String,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub const STATUS_ACTIVE: &'static str = "active";
    pub const STATUS_CANCELLED: &'static str = "cancelled";

    pub fn is_active(&self) -> bool {
        self.status == Self::STATUS_ACTIVE
    }
}

/// Request body for `POST /api/bookings`.
///
/// Contact fields default to empty strings so that missing fields surface
/// as validation errors rather than deserialization failures.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub training_id: Option<Uuid>,
    #[serde(default)]
    #[validate(length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"))]
    pub full_name: String,
    #[serde(default)]
    #[validate(email(message = "Email is not a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 5, max = 50, message = "Phone number must be between 5 and 50 characters"))]
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub training_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
    pub device_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Booking> for BookingResponse {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            training_id: booking.training_id,
            full_name: booking.full_name.clone(),
            email: booking.email.clone(),
            phone: booking.phone.clone(),
            status: booking.status.clone(),
            device_token: booking.device_token.clone(),
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Entry in `GET /api/bookings/history`, embedding a training summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookingHistoryEntry {
    pub id: Uuid,
    pub status: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub training: TrainingSummary,
}

impl BookingHistoryEntry {
    pub fn new(booking: &Booking, training: &Training) -> Self {
        Self {
            id: booking.id,
            status: booking.status.clone(),
            full_name: booking.full_name.clone(),
            email: booking.email.clone(),
            phone: booking.phone.clone(),
            created_at: booking.created_at,
            training: training.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateBookingRequest {
        CreateBookingRequest {
            training_id: Some(Uuid::new_v4()),
            full_name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "+1234567890".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let request = CreateBookingRequest {
            training_id: Some(Uuid::new_v4()),
            full_name: String::new(),
            email: String::new(),
            phone: String::new(),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("phone"));
    }

    #[test]
    fn test_invalid_email_is_rejected() {
        let mut request = valid_request();
        request.email = "not-an-email".to_string();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_short_phone_is_rejected() {
        let mut request = valid_request();
        request.phone = "123".to_string();
        assert!(request.validate().is_err());
    }
}
