use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use crate::services::{
    BookingService, EmailService, SheetSyncService, TrainingService, UserSessionService,
};

const SHEET_SYNC_INTERVAL_SECS: u64 = 60 * 60;
const REMINDER_INTERVAL_SECS: u64 = 15 * 60;
const SESSION_CLEANUP_INTERVAL_SECS: u64 = 24 * 60 * 60;
const SESSION_MAX_IDLE_DAYS: i64 = 90;

/// Background jobs: periodic sheet sync, day-before training reminders and
/// stale session cleanup.
#[derive(Clone)]
pub struct BackgroundScheduler {
    sheet_sync_service: Arc<SheetSyncService>,
    booking_service: BookingService,
    training_service: TrainingService,
    user_session_service: UserSessionService,
    email_service: Arc<EmailService>,
}

impl BackgroundScheduler {
    pub fn new(
        sheet_sync_service: Arc<SheetSyncService>,
        booking_service: BookingService,
        training_service: TrainingService,
        user_session_service: UserSessionService,
        email_service: Arc<EmailService>,
    ) -> Self {
        Self {
            sheet_sync_service,
            booking_service,
            training_service,
            user_session_service,
            email_service,
        }
    }

    /// Start the scheduler loops on their own tasks.
    pub fn start(&self) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_sheet_sync().await;
        });

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_reminder_pass().await;
        });

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_session_cleanup().await;
        });

        info!("Background scheduler started");
    }

    /// Re-sync the catalog from the spreadsheet every hour.
    async fn run_sheet_sync(&self) {
        let mut interval = interval(Duration::from_secs(SHEET_SYNC_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match self.sheet_sync_service.sync().await {
                Ok(summary) => {
                    info!(
                        "Scheduled sheet sync: {} created, {} updated, {} skipped",
                        summary.created, summary.updated, summary.skipped
                    );
                }
                Err(e) => {
                    error!("Scheduled sheet sync failed: {}", e);
                }
            }
        }
    }

    /// Send reminders for tomorrow's trainings every 15 minutes.
    async fn run_reminder_pass(&self) {
        let mut interval = interval(Duration::from_secs(REMINDER_INTERVAL_SECS));

        loop {
            interval.tick().await;

            if let Err(e) = self.send_due_reminders().await {
                error!("Reminder pass failed: {}", e);
            }
        }
    }

    async fn send_due_reminders(&self) -> anyhow::Result<()> {
        let tomorrow = (Utc::now() + ChronoDuration::days(1)).date_naive();
        let due = self.booking_service.find_due_reminders(tomorrow).await?;

        if due.is_empty() {
            return Ok(());
        }

        let mut sent = 0;
        for booking in due {
            let training = match self.training_service.find_by_id(booking.training_id).await? {
                Some(training) => training,
                None => continue,
            };

            match self
                .email_service
                .send_training_reminder(&booking, &training)
                .await
            {
                Ok(()) => {
                    self.booking_service.mark_reminder_sent(booking.id).await?;
                    sent += 1;
                }
                Err(e) => {
                    error!("Failed to send reminder for booking {}: {}", booking.id, e);
                }
            }
        }

        if sent > 0 {
            info!("Sent {} training reminders", sent);
        }

        Ok(())
    }

    /// Drop user sessions idle for more than 90 days, once a day.
    async fn run_session_cleanup(&self) {
        let mut interval = interval(Duration::from_secs(SESSION_CLEANUP_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match self
                .user_session_service
                .cleanup_stale(SESSION_MAX_IDLE_DAYS)
                .await
            {
                Ok(deleted) => {
                    if deleted > 0 {
                        info!("Cleaned up {} stale user sessions", deleted);
                    }
                }
                Err(e) => {
                    error!("Session cleanup failed: {}", e);
                }
            }
        }
    }
}
