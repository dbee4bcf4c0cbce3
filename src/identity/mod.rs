// Device-token identity: anonymous visitors are identified by an opaque
// per-browser token carried in a cookie or header.

pub mod device_token;

pub use device_token::{device_cookie, generate_token, DeviceToken, DEVICE_TOKEN_COOKIE};
