use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{json, Value};
use validator::Validate;

use super::errors::ApiError;
use super::routes::AppState;
use crate::identity::{device_cookie, DeviceToken};
use crate::models::{SaveUserDataRequest, UserDataResponse};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(get_user_data).post(save_user_data))
}

/// Saved profile for the calling device, used to prefill the booking form.
pub async fn get_user_data(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let session = state
        .user_session_service
        .find_by_device_token(device.as_str())
        .await?;

    let response = match session {
        Some(session) => json!({
            "message": "User data retrieved successfully",
            "data": UserDataResponse::from(&session),
        }),
        None => json!({
            "message": "No user data found",
            "data": null,
        }),
    };

    Ok((jar.add(device_cookie(device.as_str())), Json(response)))
}

/// Save or update the profile for the calling device.
pub async fn save_user_data(
    State(state): State<AppState>,
    device: DeviceToken,
    jar: CookieJar,
    Json(request): Json<SaveUserDataRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    if !request.is_complete() {
        return Err(ApiError::InvalidRequest("Invalid data provided".to_string()));
    }

    request.validate()?;

    state
        .user_session_service
        .save_profile(
            device.as_str(),
            request.full_name.as_deref().unwrap_or_default(),
            request.email.as_deref().unwrap_or_default(),
            request.phone.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        jar.add(device_cookie(device.as_str())),
        Json(json!({
            "success": true,
            "message": "User data saved successfully",
            "device_token": device.as_str(),
        })),
    ))
}
