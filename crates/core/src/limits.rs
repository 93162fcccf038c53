//! Size limits for admin authentication requests.
//!
//! These bound the work an anonymous client can cause before credentials
//! are checked.

/// Maximum login request body size in bytes (8KB).
pub const MAX_LOGIN_BODY_BYTES: usize = 8 * 1024;

/// Maximum username length in characters.
pub const MAX_USERNAME_LENGTH: usize = 128;

/// Maximum password length in bytes.
///
/// Key derivation cost grows with input length.
pub const MAX_PASSWORD_LENGTH: usize = 1024;

/// Maximum accepted return URL length.
pub const MAX_RETURN_URL_LENGTH: usize = 2048;

/// Session identifier and auth token size in bytes (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Salt size for newly generated password hashes.
pub const SALT_BYTES: usize = 16;
