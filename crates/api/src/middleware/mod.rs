//! Request middleware.

pub mod require_admin;

pub use require_admin::{require_admin, AdminSession};
