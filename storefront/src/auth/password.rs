//! Argon2 password hashing
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters, so verification needs nothing but the stored string.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash password using argon2 with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify password against a stored PHC string
///
/// `Err` only when the stored hash is malformed; a wrong password is `Ok(false)`.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(stored_hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("admin123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("admin123", &hash).unwrap());
        assert!(!verify_password("admin124", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salt() {
        let a = hash_password("123456").unwrap();
        let b = hash_password("123456").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("123456", &a).unwrap());
        assert!(verify_password("123456", &b).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }
}
