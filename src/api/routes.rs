use axum::{routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::health::health_check;
use super::{bookings, trainings, user_data};
use crate::services::{BookingService, EmailService, TrainingService, UserSessionService};

#[derive(Clone)]
pub struct AppState {
    pub training_service: TrainingService,
    pub booking_service: BookingService,
    pub user_session_service: UserSessionService,
    pub email_service: Arc<EmailService>,
}

pub fn create_routes(db: PgPool, email_service: Arc<EmailService>) -> Router {
    let state = AppState {
        training_service: TrainingService::new(db.clone()),
        booking_service: BookingService::new(db.clone()),
        user_session_service: UserSessionService::new(db),
        email_service,
    };

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/trainings", trainings::routes())
        .nest("/api/bookings", bookings::routes())
        .nest("/api/user-data", user_data::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
