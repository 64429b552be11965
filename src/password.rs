//! Password hashing and temporary password generation.
//!
//! Hashing uses bcrypt on the blocking thread pool so request workers are not
//! stalled by the key-stretching cost.

use rand::{Rng, seq::SliceRandom};
use thiserror::Error;

const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#$%^&*";

/// Length of generated temporary passwords.
pub const TEMPORARY_PASSWORD_LEN: usize = 12;

/// Minimum length accepted for user-chosen passwords.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PasswordError> for crate::error::ApiError {
    fn from(error: PasswordError) -> Self {
        anyhow::Error::new(error).into()
    }
}

/// Hashes `plain` with bcrypt at `cost`.
pub async fn hash_password(plain: &str, cost: u32) -> Result<String, PasswordError> {
    let plain = plain.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hashed)
}

/// Checks `plain` against a stored bcrypt hash. Malformed hashes never match.
pub async fn verify_password(plain: &str, hash: &str) -> bool {
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    match tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Stored password hash could not be verified");
            false
        }
        Err(err) => {
            tracing::error!(error = %err, "Password verification task failed");
            false
        }
    }
}

/// Rejects passwords that are too short to be worth hashing.
pub fn check_password_policy(plain: &str) -> Result<(), String> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}

/// Generates a temporary password with at least one uppercase letter, one
/// lowercase letter, one digit and one symbol.
pub fn generate_temporary_password() -> String {
    let mut rng = rand::thread_rng();
    let all: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = [UPPERCASE, LOWERCASE, DIGITS, SYMBOLS]
        .iter()
        .map(|set| set[rng.gen_range(0..set.len())])
        .collect();
    while chars.len() < TEMPORARY_PASSWORD_LEN {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
