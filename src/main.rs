use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use training_booking::api::routes::create_routes;
use training_booking::config::{
    run_migrations, AppConfig, DatabaseConfig, SheetSyncConfig, SmtpConfig,
};
use training_booking::services::{
    BackgroundScheduler, BookingService, EmailService, SheetSyncService, TrainingService,
    UserSessionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let db = db_config.create_pool().await?;
    run_migrations(&db).await?;

    let email_service = Arc::new(EmailService::new(
        SmtpConfig::from_env()?,
        config.public_base_url.clone(),
    )?);

    let sheet_sync_service = Arc::new(SheetSyncService::new(
        db.clone(),
        SheetSyncConfig::from_env()?,
    )?);

    let scheduler = BackgroundScheduler::new(
        sheet_sync_service,
        BookingService::new(db.clone()),
        TrainingService::new(db.clone()),
        UserSessionService::new(db.clone()),
        email_service.clone(),
    );
    scheduler.start();

    let app = create_routes(db, email_service);

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("Training booking server starting on http://{}", config.server_address());
    info!("Health check available at http://{}/health", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
