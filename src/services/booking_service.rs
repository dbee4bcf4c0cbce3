use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::identity::generate_token;
use crate::models::{Booking, CreateBookingRequest, Training};

/// Column list for the `bookings` table.
const BOOKING_COLUMNS: &str = "id, training_id, full_name, email, phone, status, \
     confirmation_token, device_token, reminder_sent_at, created_at, updated_at";

/// Partial unique index guarding the one-active-booking-per-device rule.
const ACTIVE_BOOKING_CONSTRAINT: &str = "uq_bookings_active_training_device";

/// Booking lifecycle: seat reservation and release.
#[derive(Clone)]
pub struct BookingService {
    db: PgPool,
}

impl BookingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Reserve a seat on a training for the calling device.
    ///
    /// The slot counter is decremented with a conditional update inside the
    /// same transaction as the booking insert, so two requests racing for
    /// the last seat cannot both succeed. The partial unique index backstops
    /// the duplicate-booking pre-check the same way.
    pub async fn create(
        &self,
        training: &Training,
        request: &CreateBookingRequest,
        device_token: &str,
    ) -> Result<Booking, ApiError> {
        if training.slots_available <= 0 {
            return Err(ApiError::NoSlotsAvailable);
        }

        if self
            .find_active_for_training(training.id, device_token)
            .await?
            .is_some()
        {
            return Err(ApiError::DuplicateBooking);
        }

        request.validate()?;

        let mut tx = self.db.begin().await?;

        let decremented = sqlx::query(
            "UPDATE trainings \
             SET slots_available = slots_available - 1, updated_at = $2 \
             WHERE id = $1 AND slots_available > 0",
        )
        .bind(training.id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Err(ApiError::NoSlotsAvailable);
        }

        let insert_query = format!(
            "INSERT INTO bookings \
                (training_id, full_name, email, phone, status, confirmation_token, device_token) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let booking = sqlx::query_as::<_, Booking>(&insert_query)
            .bind(training.id)
            .bind(&request.full_name)
            .bind(&request.email)
            .bind(&request.phone)
            .bind(Booking::STATUS_ACTIVE)
            .bind(generate_token())
            .bind(device_token)
            .fetch_one(&mut *tx)
            .await
            .map_err(|error| {
                if is_unique_violation(&error, ACTIVE_BOOKING_CONSTRAINT) {
                    ApiError::DuplicateBooking
                } else {
                    ApiError::Database(error)
                }
            })?;

        tx.commit().await?;

        Ok(booking)
    }

    /// Cancel a booking owned by the calling device and release its seat.
    ///
    /// The status flip is guarded on the current status, so of two cancels
    /// racing for the same booking only one takes effect and the seat is
    /// released exactly once.
    pub async fn cancel(&self, booking_id: Uuid, device_token: &str) -> Result<Booking, ApiError> {
        let booking = self
            .find_by_id(booking_id)
            .await?
            .ok_or(ApiError::BookingNotFound)?;

        if booking.device_token != device_token {
            return Err(ApiError::AccessDenied);
        }

        let mut tx = self.db.begin().await?;

        let update_query = format!(
            "UPDATE bookings SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status = $4 RETURNING {BOOKING_COLUMNS}"
        );
        let cancelled = sqlx::query_as::<_, Booking>(&update_query)
            .bind(booking.id)
            .bind(Booking::STATUS_CANCELLED)
            .bind(Utc::now())
            .bind(Booking::STATUS_ACTIVE)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ApiError::AlreadyCancelled)?;

        // Release the seat, clamped so the counter never exceeds capacity.
        sqlx::query(
            "UPDATE trainings \
             SET slots_available = LEAST(slots, slots_available + 1), updated_at = $2 \
             WHERE id = $1",
        )
        .bind(booking.training_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(cancelled)
    }

    pub async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, ApiError> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(booking_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(booking)
    }

    /// Active bookings held by a device, used to annotate catalog reads.
    pub async fn find_active_by_device_token(
        &self,
        device_token: &str,
    ) -> Result<Vec<Booking>, ApiError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE device_token = $1 AND status = $2"
        );
        let bookings = sqlx::query_as::<_, Booking>(&query)
            .bind(device_token)
            .bind(Booking::STATUS_ACTIVE)
            .fetch_all(&self.db)
            .await?;

        Ok(bookings)
    }

    /// Full booking history for a device (any status), newest first.
    pub async fn find_history_by_device_token(
        &self,
        device_token: &str,
    ) -> Result<Vec<Booking>, ApiError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE device_token = $1 ORDER BY created_at DESC"
        );
        let bookings = sqlx::query_as::<_, Booking>(&query)
            .bind(device_token)
            .fetch_all(&self.db)
            .await?;

        Ok(bookings)
    }

    async fn find_active_for_training(
        &self,
        training_id: Uuid,
        device_token: &str,
    ) -> Result<Option<Booking>, ApiError> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE training_id = $1 AND device_token = $2 AND status = $3"
        );
        let booking = sqlx::query_as::<_, Booking>(&query)
            .bind(training_id)
            .bind(device_token)
            .bind(Booking::STATUS_ACTIVE)
            .fetch_optional(&self.db)
            .await?;

        Ok(booking)
    }

    /// Active bookings for trainings on the given date that have not been
    /// reminded yet.
    pub async fn find_due_reminders(&self, date: NaiveDate) -> Result<Vec<Booking>, ApiError> {
        let query = format!(
            "SELECT b.{} FROM bookings b \
             JOIN trainings t ON t.id = b.training_id \
             WHERE b.status = $1 AND b.reminder_sent_at IS NULL AND t.date = $2",
            BOOKING_COLUMNS.replace(", ", ", b.")
        );
        let bookings = sqlx::query_as::<_, Booking>(&query)
            .bind(Booking::STATUS_ACTIVE)
            .bind(date)
            .fetch_all(&self.db)
            .await?;

        Ok(bookings)
    }

    pub async fn mark_reminder_sent(&self, booking_id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE bookings SET reminder_sent_at = $2, updated_at = $2 WHERE id = $1")
            .bind(booking_id)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    error
        .as_database_error()
        .and_then(|db_error| db_error.constraint())
        .map(|name| name == constraint)
        .unwrap_or(false)
}
