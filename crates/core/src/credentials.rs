//! Admin credential hashing and verification.
//!
//! The admin password is stored as a PHC string
//! (`$pbkdf2-sha256$i=...,l=32$<salt>$<hash>`) produced by [`hash_password`].

use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::error;

use crate::error::{Error, Result};
use crate::hijack::constant_time_eq;
use crate::limits::SALT_BYTES;

/// PBKDF2-SHA256 rounds for newly generated hashes.
pub const DEFAULT_HASH_ROUNDS: u32 = 600_000;

/// Hashes a password with the default work factor.
pub fn hash_password(password: &str) -> Result<String> {
    hash_password_with_rounds(password, DEFAULT_HASH_ROUNDS)
}

/// Hashes a password with an explicit round count.
pub fn hash_password_with_rounds(password: &str, rounds: u32) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::password_hash(e.to_string()))?;

    let params = Params {
        rounds,
        output_length: 32,
    };

    let hash = Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map_err(|e| Error::password_hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Parses a PHC hash string, rejecting malformed values.
pub fn parse_password_hash(phc: &str) -> Result<PasswordHash<'_>> {
    PasswordHash::new(phc).map_err(|e| Error::config(format!("invalid admin_password_hash: {}", e)))
}

/// Verifies a password against a PHC hash in constant time.
pub fn verify_password(password: &str, phc: &str) -> bool {
    let parsed = match parse_password_hash(phc) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, "Configured admin password hash is unusable");
            return false;
        }
    };

    Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok()
}

/// Checks a username/password pair against the configured admin account.
///
/// The password is always verified so the response time does not reveal
/// whether the username matched.
pub fn verify_admin(
    username: &str,
    password: &str,
    admin_username: &str,
    admin_password_hash: &str,
) -> bool {
    let username_ok = constant_time_eq(username.as_bytes(), admin_username.as_bytes());
    let password_ok = verify_password(password, admin_password_hash);
    username_ok & password_ok
}
