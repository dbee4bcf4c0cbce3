// Business logic services

pub mod booking_service;
pub mod email_service;
pub mod scheduler;
pub mod sheet_sync_service;
pub mod training_service;
pub mod user_session_service;

pub use booking_service::BookingService;
pub use email_service::EmailService;
pub use scheduler::BackgroundScheduler;
pub use sheet_sync_service::{SheetSyncService, SyncSummary};
pub use training_service::TrainingService;
pub use user_session_service::UserSessionService;
