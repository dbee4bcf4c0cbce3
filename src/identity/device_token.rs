use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::RngCore;
use std::convert::Infallible;
use std::fmt::Write;

pub const DEVICE_TOKEN_COOKIE: &str = "device_token";

const COOKIE_LIFETIME_DAYS: i64 = 365;
const TOKEN_BYTES: usize = 16;

/// Opaque per-device identifier resolved from the request.
///
/// Resolution order: `device_token` cookie, then `X-Device-Token` header,
/// then a freshly generated token. Handlers re-set the cookie on every
/// response so a generated token sticks to the browser.
#[derive(Debug, Clone)]
pub struct DeviceToken(pub String);

impl DeviceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DeviceToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_cookie = CookieJar::from_headers(&parts.headers)
            .get(DEVICE_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string());

        let token = from_cookie
            .or_else(|| {
                parts
                    .headers
                    .get("x-device-token")
                    .and_then(|value| value.to_str().ok())
                    .map(|value| value.to_string())
            })
            .filter(|token| !token.is_empty())
            .unwrap_or_else(generate_token);

        Ok(DeviceToken(token))
    }
}

/// Generate a 32-character hex token (16 random bytes).
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);

    bytes.iter().fold(String::with_capacity(TOKEN_BYTES * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

/// Build the long-lived device cookie attached to every API response.
pub fn device_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((DEVICE_TOKEN_COOKIE, token.to_string()))
        .path("/")
        .max_age(time::Duration::days(COOKIE_LIFETIME_DAYS))
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_device_cookie_attributes() {
        let cookie = device_cookie("abc123");
        assert_eq!(cookie.name(), DEVICE_TOKEN_COOKIE);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(365)));
    }

    #[tokio::test]
    async fn test_token_resolution_order() {
        use axum::http::Request;

        // Cookie wins over header
        let request = Request::builder()
            .header("cookie", "device_token=from-cookie")
            .header("x-device-token", "from-header")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let token = DeviceToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token.as_str(), "from-cookie");

        // Header is used when no cookie is present
        let request = Request::builder()
            .header("x-device-token", "from-header")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let token = DeviceToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token.as_str(), "from-header");

        // Otherwise a fresh token is generated
        let request = Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let token = DeviceToken::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(token.as_str().len(), 32);
    }
}
