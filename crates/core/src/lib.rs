//! Core types and session gate for the staff directory admin panel.

pub mod auth;
pub mod clock;
pub mod config;
pub mod cookie;
pub mod credentials;
pub mod error;
pub mod gate;
pub mod hijack;
pub mod limits;
pub mod session;
pub mod store;

pub use auth::*;
pub use clock::*;
pub use config::AuthConfig;
pub use cookie::{parse_cookie_header, SameSite, SetCookie};
pub use error::{AuthErrorCode, Error, Result, SessionErrorCode, ValidationErrorCode};
pub use gate::*;
pub use session::*;
pub use store::*;
