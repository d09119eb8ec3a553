use serde::Deserialize;

use crate::schema::{Validate, ValidationError};

/// Request body for login. Strength rules apply only at registration.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl Validate for LoginRequest {
    const FIELDS: &'static [&'static str] = &["username", "password"];

    fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::new("username", "Username is required"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "Password is required"));
        }
        Ok(())
    }
}
