//! Password policy and Argon2 hashing.
//!
//! Argon2 is CPU-bound on purpose, so both hashing and verification run on
//! tokio's blocking pool instead of a runtime worker.

use std::fmt;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// A plaintext password that satisfies the registration policy.
pub struct Password(String);

impl Password {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest("Password too short".into()));
        }
        Ok(Self(raw.to_string()))
    }

    /// PHC string with a fresh random salt.
    pub async fn hash(self) -> anyhow::Result<String> {
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(self.0.as_bytes(), &salt)
                .map(|h| h.to_string())
                .map_err(|e| {
                    error!(error = %e, "argon2 hash failed");
                    anyhow::anyhow!("argon2 hash failed: {e}")
                })
        })
        .await
        .context("password hashing task")?
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

/// Checks a login attempt against a stored hash. The policy is not applied:
/// a stored hash may predate it.
pub async fn verify(attempt: String, stored: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored).map_err(|e| {
            error!(error = %e, "stored password hash is unreadable");
            anyhow::anyhow!("unreadable password hash: {e}")
        })?;
        Ok(Argon2::default()
            .verify_password(attempt.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .context("password verify task")?
}
