//! Session hijack heuristics.
//!
//! At login the gate stores a random auth token in the server-side session
//! and hands the client only `SHA-256(token || user_agent)` in a separate
//! cookie. A stolen session cookie replayed from another browser fails the
//! check unless the attacker also has the auth-check cookie and the same
//! user-agent string. This is a heuristic: user-agent spoofing defeats it.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::limits::TOKEN_BYTES;

/// Generates a random 256-bit token, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Derives the auth-check cookie value for a token and user-agent.
pub fn derive_auth_check_value(auth_token: &str, user_agent: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(auth_token.as_bytes());
    hasher.update(user_agent.as_bytes());
    hex::encode(hasher.finalize())
}

/// Checks a presented auth-check cookie against the session's token.
pub fn verify_auth_check(presented: &str, auth_token: &str, user_agent: &str) -> bool {
    let expected = derive_auth_check_value(auth_token, user_agent);
    constant_time_eq(presented.as_bytes(), expected.as_bytes())
}

/// Constant-time byte comparison.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
