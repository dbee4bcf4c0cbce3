// API routes and handlers

pub mod bookings;
pub mod errors;
pub mod health;
pub mod routes;
pub mod trainings;
pub mod user_data;
