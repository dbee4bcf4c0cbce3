// Data models and request/response types

pub mod booking;
pub mod training;
pub mod user_session;

pub use booking::*;
pub use training::*;
pub use user_session::*;
