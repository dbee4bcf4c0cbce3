use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use training_booking::api::errors::ApiError;
use training_booking::api::routes::create_routes;
use training_booking::config::SmtpConfig;
use training_booking::models::{Booking, CreateBookingRequest, Training};
use training_booking::services::{BookingService, EmailService};

async fn seed_training(pool: &PgPool, slots: i32) -> Training {
    sqlx::query_as::<_, Training>(
        "INSERT INTO trainings \
            (sheet_row_id, date, time, title, slots, slots_available, price) \
         VALUES ($1, CURRENT_DATE + 7, '18:30', 'Yoga Class', $2, $2, 450.0) \
         RETURNING id, sheet_row_id, date, time, title, slots, slots_available, \
                   price, created_at, updated_at",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(slots)
    .fetch_one(pool)
    .await
    .expect("seed training")
}

async fn slots_available(pool: &PgPool, training_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT slots_available FROM trainings WHERE id = $1")
        .bind(training_id)
        .fetch_one(pool)
        .await
        .expect("slot counter")
}

fn booking_request(training_id: Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        training_id: Some(training_id),
        full_name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone: "+12345678".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_booking_decrements_slot_counter(pool: PgPool) {
    let training = seed_training(&pool, 3).await;
    let service = BookingService::new(pool.clone());

    let booking = service
        .create(&training, &booking_request(training.id), "device-a")
        .await
        .unwrap();

    assert_eq!(booking.status, Booking::STATUS_ACTIVE);
    assert!(booking.is_active());
    assert_eq!(slots_available(&pool, training.id).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_active_booking_is_rejected(pool: PgPool) {
    let training = seed_training(&pool, 3).await;
    let service = BookingService::new(pool.clone());
    let request = booking_request(training.id);

    service.create(&training, &request, "device-a").await.unwrap();

    let err = service.create(&training, &request, "device-a").await.unwrap_err();
    assert!(matches!(err, ApiError::DuplicateBooking));
    assert_eq!(slots_available(&pool, training.id).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_full_training_rejects_booking(pool: PgPool) {
    let training = seed_training(&pool, 1).await;
    let service = BookingService::new(pool.clone());

    service
        .create(&training, &booking_request(training.id), "device-a")
        .await
        .unwrap();

    // The caller's snapshot still shows a free seat; the conditional
    // decrement inside the transaction is what must refuse the second seat.
    let err = service
        .create(&training, &booking_request(training.id), "device-b")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NoSlotsAvailable));
    assert_eq!(slots_available(&pool, training.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_releases_exactly_one_seat(pool: PgPool) {
    let training = seed_training(&pool, 3).await;
    let service = BookingService::new(pool.clone());

    let booking = service
        .create(&training, &booking_request(training.id), "device-a")
        .await
        .unwrap();
    assert_eq!(slots_available(&pool, training.id).await, 2);

    let cancelled = service.cancel(booking.id, "device-a").await.unwrap();
    assert_eq!(cancelled.status, Booking::STATUS_CANCELLED);
    assert_eq!(slots_available(&pool, training.id).await, 3);

    // A repeated cancel must not release the seat again.
    let err = service.cancel(booking.id, "device-a").await.unwrap_err();
    assert!(matches!(err, ApiError::AlreadyCancelled));
    assert_eq!(slots_available(&pool, training.id).await, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_requires_owning_device(pool: PgPool) {
    let training = seed_training(&pool, 3).await;
    let service = BookingService::new(pool.clone());

    let booking = service
        .create(&training, &booking_request(training.id), "device-a")
        .await
        .unwrap();

    let err = service.cancel(booking.id, "device-b").await.unwrap_err();
    assert!(matches!(err, ApiError::AccessDenied));
    assert_eq!(slots_available(&pool, training.id).await, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rebooking_after_cancel_is_allowed(pool: PgPool) {
    let training = seed_training(&pool, 3).await;
    let service = BookingService::new(pool.clone());
    let request = booking_request(training.id);

    let booking = service.create(&training, &request, "device-a").await.unwrap();
    service.cancel(booking.id, "device-a").await.unwrap();

    // Only active bookings count against the one-per-training rule.
    service.create(&training, &request, "device-a").await.unwrap();
    assert_eq!(slots_available(&pool, training.id).await, 2);
}

fn test_email_service() -> Arc<EmailService> {
    Arc::new(
        EmailService::new(
            SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                username: String::new(),
                password: String::new(),
                from_email: "noreply@training-booking.local".to_string(),
                from_name: "Training Booking".to_string(),
            },
            "http://localhost:3000".to_string(),
        )
        .expect("email service"),
    )
}

#[sqlx::test(migrations = "./migrations")]
async fn test_user_data_response_sets_device_cookie(pool: PgPool) {
    let app = create_routes(pool, test_email_service());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/user-data")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("device cookie on user-data response")
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("device_token="));
}
