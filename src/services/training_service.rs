use sqlx::PgPool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::models::Training;

/// Column list for the `trainings` table.
const TRAINING_COLUMNS: &str =
    "id, sheet_row_id, date, time, title, slots, slots_available, price, created_at, updated_at";

/// Read side of the training catalog.
#[derive(Clone)]
pub struct TrainingService {
    db: PgPool,
}

impl TrainingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Upcoming trainings (today or later), soonest first.
    pub async fn find_upcoming(&self) -> Result<Vec<Training>, ApiError> {
        let query = format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings \
             WHERE date >= CURRENT_DATE ORDER BY date ASC, time ASC"
        );
        let trainings = sqlx::query_as::<_, Training>(&query)
            .fetch_all(&self.db)
            .await?;

        Ok(trainings)
    }

    /// Upcoming trainings that still have free seats.
    pub async fn find_available(&self) -> Result<Vec<Training>, ApiError> {
        let query = format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings \
             WHERE date >= CURRENT_DATE AND slots_available > 0 \
             ORDER BY date ASC, time ASC"
        );
        let trainings = sqlx::query_as::<_, Training>(&query)
            .fetch_all(&self.db)
            .await?;

        Ok(trainings)
    }

    pub async fn find_by_id(&self, training_id: Uuid) -> Result<Option<Training>, ApiError> {
        let query = format!("SELECT {TRAINING_COLUMNS} FROM trainings WHERE id = $1");
        let training = sqlx::query_as::<_, Training>(&query)
            .bind(training_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(training)
    }
}
