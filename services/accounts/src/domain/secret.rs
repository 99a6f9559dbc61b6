//! Time-boxed single-use secrets.
//!
//! Registration OTPs, registration tickets, and deletion OTPs all follow the
//! same shape: a random value handed out exactly once, a stored representation
//! (plaintext for short codes, digest for tickets/deletion OTPs), and an
//! expiry timestamp. This module owns generation and digesting so the two
//! flows cannot drift apart.

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;
use sha2::{Digest, Sha256};

/// Fixed-length numeric code from the thread-local CSPRNG.
pub fn generate_numeric_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Opaque high-entropy identifier (32 hex chars).
pub fn generate_request_id() -> String {
    random_hex::<16>()
}

/// Hex encoding of `N` random bytes.
pub fn random_hex<const N: usize>() -> String {
    let mut rng = rand::rng();
    hex::encode(rng.random::<[u8; N]>())
}

/// One-way digest for short-lived tokens: lowercase hex SHA-256.
/// Not a password hash — an unkeyed integrity check for equality comparison.
pub fn token_digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// A freshly minted secret. The raw value goes to the caller (or the mailer)
/// exactly once; only `digest` and `expires_at` are ever stored.
#[derive(Debug, Clone)]
pub struct IssuedSecret {
    pub raw: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_numeric(len: usize, ttl_secs: i64, now: DateTime<Utc>) -> IssuedSecret {
    let raw = generate_numeric_code(len);
    let digest = token_digest(&raw);
    IssuedSecret {
        raw,
        digest,
        expires_at: now + Duration::seconds(ttl_secs),
    }
}
