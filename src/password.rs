//! Password utilities

use argon2::Argon2;
use argon2::password_hash::Error;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of a generated secret
const GENERATED_LENGTH: usize = 32;

/// Generate a new random secret
pub fn generate() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a given password
///
/// # Errors
///
/// Will return `Err` when argon2 rejects the input
pub fn hash(password: &str) -> Result<String, Error> {
    let mut salt = [0_u8; 16];
    rand::rng().fill(&mut salt);

    let salt = SaltString::encode_b64(&salt)?;

    let argon2 = Argon2::default();

    let hashed_password = argon2.hash_password(password.as_bytes(), &salt)?;

    Ok(hashed_password.to_string())
}

/// Verify a given password against a given hash
///
/// A hash that can not be parsed never verifies
pub fn verify(hashed_password: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hashed_password) else {
        tracing::error!("Stored password hash can not be parsed");
        return false;
    };

    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
