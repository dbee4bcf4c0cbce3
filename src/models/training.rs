use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A scheduled training session, synced from the external spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Training {
    pub id: Uuid,
    /// Row identifier in the source spreadsheet, used as the upsert key
    pub sheet_row_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub title: String,
    pub slots: i32,
    pub slots_available: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Training {
    pub fn date_formatted(&self) -> String {
        self.date.format("%d.%m.%Y").to_string()
    }

    pub fn time_formatted(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// Training as returned by the catalog endpoints, annotated with the
/// calling device's booking state.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub date_formatted: String,
    pub time_formatted: String,
    pub title: String,
    pub slots: i32,
    pub slots_available: i32,
    pub price: f64,
    pub user_booked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_booking_id: Option<Uuid>,
}

impl TrainingResponse {
    pub fn from_training(training: &Training, user_booking_id: Option<Uuid>) -> Self {
        Self {
            id: training.id,
            date: training.date,
            time: training.time,
            date_formatted: training.date_formatted(),
            time_formatted: training.time_formatted(),
            title: training.title.clone(),
            slots: training.slots,
            slots_available: training.slots_available,
            price: training.price,
            user_booked: user_booking_id.is_some(),
            user_booking_id,
        }
    }
}

/// Compact training payload embedded in booking history entries.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub id: Uuid,
    pub title: String,
    pub date_formatted: String,
    pub time_formatted: String,
}

impl From<&Training> for TrainingSummary {
    fn from(training: &Training) -> Self {
        Self {
            id: training.id,
            title: training.title.clone(),
            date_formatted: training.date_formatted(),
            time_formatted: training.time_formatted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_training() -> Training {
        Training {
            id: Uuid::new_v4(),
            sheet_row_id: "42".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            title: "Yoga Class".to_string(),
            slots: 10,
            slots_available: 3,
            price: 450.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_date_and_time_formatting() {
        let training = sample_training();
        assert_eq!(training.date_formatted(), "07.03.2025");
        assert_eq!(training.time_formatted(), "18:30");
    }

    #[test]
    fn test_response_annotation() {
        let training = sample_training();
        let booking_id = Uuid::new_v4();

        let booked = TrainingResponse::from_training(&training, Some(booking_id));
        assert!(booked.user_booked);
        assert_eq!(booked.user_booking_id, Some(booking_id));

        let not_booked = TrainingResponse::from_training(&training, None);
        assert!(!not_booked.user_booked);
        assert!(not_booked.user_booking_id.is_none());

        let json = serde_json::to_value(&not_booked).unwrap();
        assert!(json.get("user_booking_id").is_none());
    }
}
