use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Phone format accepted by the profile form: 7-15 digits, optional
/// leading +, spaces and hyphens allowed.
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9\s-]{7,15}$").unwrap());

/// Per-device profile used to prefill the booking form.
///
/// Created lazily on the first write for a device token and refreshed on
/// every booking or profile save.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSession {
    pub id: Uuid,
    pub device_token: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub last_visit: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/user-data`. All three fields are required;
/// the handler rejects partial payloads before validation runs.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveUserDataRequest {
    #[validate(length(min = 2, max = 255, message = "Full name must be between 2 and 255 characters"))]
    pub full_name: Option<String>,
    #[validate(email(message = "Email is not a valid email address"))]
    pub email: Option<String>,
    #[validate(regex(
        path = "PHONE_RE",
        message = "Phone number must be valid (7-15 digits, may include +, spaces or hyphens)"
    ))]
    pub phone: Option<String>,
}

impl SaveUserDataRequest {
    pub fn is_complete(&self) -> bool {
        self.full_name.is_some() && self.email.is_some() && self.phone.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&UserSession> for UserDataResponse {
    fn from(session: &UserSession) -> Self {
        Self {
            full_name: session.full_name.clone(),
            email: session.email.clone(),
            phone: session.phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(full_name: &str, email: &str, phone: &str) -> SaveUserDataRequest {
        SaveUserDataRequest {
            full_name: Some(full_name.to_string()),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
        }
    }

    #[test]
    fn test_valid_profiles() {
        for phone in ["+12345678901", "1234567", "123 456-789"] {
            let req = request("Jane Doe", "jane@example.com", phone);
            assert!(req.validate().is_ok(), "should accept phone: {}", phone);
        }
    }

    #[test]
    fn test_invalid_phone_numbers() {
        for phone in ["123", "abcdefgh", "+1 (234) 5678", "1234567890123456"] {
            let req = request("Jane Doe", "jane@example.com", phone);
            assert!(req.validate().is_err(), "should reject phone: {}", phone);
        }
    }

    #[test]
    fn test_incomplete_payload() {
        let req = SaveUserDataRequest {
            full_name: Some("Jane Doe".to_string()),
            email: None,
            phone: Some("+12345678".to_string()),
        };
        assert!(!req.is_complete());
    }

    #[test]
    fn test_short_name_is_rejected() {
        let req = request("J", "jane@example.com", "+12345678");
        assert!(req.validate().is_err());
    }
}
