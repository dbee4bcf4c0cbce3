//! One-shot catalog sync from the configured Google Sheet, intended to be
//! run from cron or by hand.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use training_booking::config::{run_migrations, DatabaseConfig, SheetSyncConfig};
use training_booking::services::SheetSyncService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let db = DatabaseConfig::from_env()?.create_pool().await?;
    run_migrations(&db).await?;

    let service = SheetSyncService::new(db, SheetSyncConfig::from_env()?)?;

    info!("Starting synchronization with Google Sheets");
    let summary = service.sync().await?;
    info!(
        "Trainings synchronized successfully: {} created, {} updated, {} skipped",
        summary.created, summary.updated, summary.skipped
    );

    Ok(())
}
