//! Password generation for IAM login profiles
//!
//! Candidates are drawn uniformly from the full alphabet and rejected until
//! one contains every character class the strictest IAM password policy
//! asks for.

use rand::Rng;
use rand::rngs::OsRng;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|'";

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 128;

const MAX_ATTEMPTS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {0}")]
    InvalidLength(usize),

    #[error("failed to generate acceptable password")]
    Exhausted,
}

pub fn generate_password(length: usize) -> Result<String, PasswordError> {
    generate_with(&mut OsRng, length)
}

fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> Result<String, PasswordError> {
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        return Err(PasswordError::InvalidLength(length));
    }

    let charset: Vec<u8> = [LOWER, UPPER, DIGITS, SYMBOLS].concat().into_bytes();
    let mut candidate = vec![0u8; length];

    for _ in 0..MAX_ATTEMPTS {
        for byte in candidate.iter_mut() {
            *byte = charset[rng.gen_range(0..charset.len())];
        }
        if meets_policy(&candidate) {
            return Ok(candidate.iter().map(|&b| b as char).collect());
        }
    }

    Err(PasswordError::Exhausted)
}

/// Whether every character class appears at least once
pub fn meets_policy(password: &[u8]) -> bool {
    [LOWER, UPPER, DIGITS, SYMBOLS]
        .iter()
        .all(|class| password.iter().any(|b| class.as_bytes().contains(b)))
}
