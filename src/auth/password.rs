use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    // Verified against when the username is unknown, so a miss costs the
    // same as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash_password("Dummy-passw0rd").ok();
}

/// Argon2id with a fresh per-user salt, encoded as a PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!("hash password: {e}")
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` only when `hash` is not a PHC string.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Burns one verification for a login against an unknown username.
pub fn verify_dummy(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_and_is_salted() {
        let a = hash_password("Password1").expect("hash");
        let b = hash_password("Password1").expect("hash");
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
        assert!(verify_password("Password1", &a).unwrap());
        assert!(verify_password("Password1", &b).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let hash = hash_password("Password1").expect("hash");
        assert!(!verify_password("password1", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_error() {
        assert!(verify_password("Password1", "plaintext").is_err());
    }

    #[test]
    fn dummy_verification_does_not_panic() {
        verify_dummy("anything");
    }
}
