use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::api::errors::ApiError;
use crate::models::UserSession;

const SESSION_COLUMNS: &str =
    "id, device_token, full_name, email, phone, last_visit, created_at, updated_at";

/// Per-device profile store used for booking form prefill.
#[derive(Clone)]
pub struct UserSessionService {
    db: PgPool,
}

impl UserSessionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn find_by_device_token(
        &self,
        device_token: &str,
    ) -> Result<Option<UserSession>, ApiError> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM user_sessions WHERE device_token = $1");
        let session = sqlx::query_as::<_, UserSession>(&query)
            .bind(device_token)
            .fetch_optional(&self.db)
            .await?;

        Ok(session)
    }

    /// Create or refresh the profile for a device token.
    ///
    /// Empty strings are treated as "leave the stored value alone" so a
    /// booking with a blank optional field never erases a saved profile.
    pub async fn save_profile(
        &self,
        device_token: &str,
        full_name: &str,
        email: &str,
        phone: &str,
    ) -> Result<UserSession, ApiError> {
        let query = format!(
            "INSERT INTO user_sessions (device_token, full_name, email, phone, last_visit) \
             VALUES ($1, NULLIF($2, ''), NULLIF($3, ''), NULLIF($4, ''), $5) \
             ON CONFLICT (device_token) DO UPDATE SET \
                full_name = COALESCE(NULLIF(EXCLUDED.full_name, ''), user_sessions.full_name), \
                email = COALESCE(NULLIF(EXCLUDED.email, ''), user_sessions.email), \
                phone = COALESCE(NULLIF(EXCLUDED.phone, ''), user_sessions.phone), \
                last_visit = EXCLUDED.last_visit, \
                updated_at = EXCLUDED.last_visit \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, UserSession>(&query)
            .bind(device_token)
            .bind(full_name)
            .bind(email)
            .bind(phone)
            .bind(Utc::now())
            .fetch_one(&self.db)
            .await?;

        Ok(session)
    }

    /// Delete sessions that have not been seen for `max_idle_days`.
    pub async fn cleanup_stale(&self, max_idle_days: i64) -> Result<u64, ApiError> {
        let cutoff = Utc::now() - Duration::days(max_idle_days);

        let result = sqlx::query("DELETE FROM user_sessions WHERE last_visit < $1")
            .bind(cutoff)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }
}
