//! Record types and field rules shared by the API server and its clients.
//!
//! Every `New*` input type implements [`Validate`]. The server runs the same
//! check a client form should run before submitting, so both ends reject the
//! same input with the same field name and message.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const TITLE_MIN: usize = 3;
pub const DESCRIPTION_MIN: usize = 10;
pub const PRICE_MIN: i32 = 1;

/// First rule a value broke, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub trait Validate {
    /// Wire names of the form's fields, used to name the field in decode errors.
    const FIELDS: &'static [&'static str];

    /// Checks fields in declaration order and stops at the first violation.
    fn validate(&self) -> Result<(), ValidationError>;
}

fn min_chars(
    field: &'static str,
    value: &str,
    min: usize,
    message: &str,
) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

pub fn check_username(username: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    }
    min_chars(
        "username",
        username,
        USERNAME_MIN,
        "Username must be at least 3 characters",
    )?;
    if username.chars().count() > USERNAME_MAX {
        return Err(ValidationError::new(
            "username",
            "Username must be at most 20 characters",
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::new(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    min_chars(
        "password",
        password,
        PASSWORD_MIN,
        "Password must be at least 6 characters",
    )?;
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one number",
        ));
    }
    Ok(())
}

pub fn check_title(title: &str) -> Result<(), ValidationError> {
    min_chars("title", title, TITLE_MIN, "Title must be at least 3 characters")
}

pub fn check_description(description: &str) -> Result<(), ValidationError> {
    min_chars(
        "description",
        description,
        DESCRIPTION_MIN,
        "Description must be at least 10 characters",
    )
}

pub fn check_price(price: i32) -> Result<(), ValidationError> {
    if price < PRICE_MIN {
        return Err(ValidationError::new("price", "Price must be greater than 0"));
    }
    Ok(())
}

/// Stored account. The hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

impl Validate for NewUser {
    const FIELDS: &'static [&'static str] = &["username", "password"];

    fn validate(&self) -> Result<(), ValidationError> {
        check_username(&self.username)?;
        check_password(&self.password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub price: i32,
    pub image: String,
    pub whatsapp: String,
    pub seller_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: i32,
    pub image: String,
    pub whatsapp: String,
}

impl Validate for NewProduct {
    const FIELDS: &'static [&'static str] =
        &["title", "description", "price", "image", "whatsapp"];

    fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_description(&self.description)?;
        check_price(self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub salary: String,
    pub whatsapp: String,
    pub employer_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub salary: String,
    pub whatsapp: String,
}

impl Validate for NewJob {
    const FIELDS: &'static [&'static str] = &["title", "description", "salary", "whatsapp"];

    fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_description(&self.description)
    }
}

/// A posted service request ("need a plumber"), not an HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub budget: Option<String>,
    pub requester_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub budget: Option<String>,
}

impl Validate for NewServiceRequest {
    const FIELDS: &'static [&'static str] = &["title", "description", "budget"];

    fn validate(&self) -> Result<(), ValidationError> {
        check_title(&self.title)?;
        check_description(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn username_rules() {
        assert!(check_username("jo_hn42").is_ok());
        assert_eq!(check_username("ab").unwrap_err().field, "username");
        assert!(check_username(&"a".repeat(20)).is_ok());
        assert!(check_username(&"a".repeat(21)).is_err());
        let err = check_username("john doe").unwrap_err();
        assert!(err.message.contains("letters, numbers, and underscores"));
    }

    #[test]
    fn password_needs_uppercase_and_digit() {
        assert!(check_password("Secret1").is_ok());

        let err = check_password("secret1").unwrap_err();
        assert_eq!(err.field, "password");
        assert!(err.message.contains("uppercase"));

        let err = check_password("Secrets").unwrap_err();
        assert_eq!(err.field, "password");
        assert!(err.message.contains("number"));

        let err = check_password("Ab1").unwrap_err();
        assert!(err.message.contains("at least 6"));
    }

    #[test]
    fn registration_reports_username_before_password() {
        let err = new_user("x", "weak").validate().unwrap_err();
        assert_eq!(err.field, "username");
        assert!(new_user("demo_user", "Password1").validate().is_ok());
    }

    #[test]
    fn short_title_names_title_field() {
        let p = NewProduct {
            title: "TV".into(),
            description: "Barely used, works great".into(),
            price: 100,
            image: "https://example.com/tv.png".into(),
            whatsapp: "27123456789".into(),
        };
        let err = p.validate().unwrap_err();
        assert_eq!(err.field, "title");
        assert_eq!(err.message, "Title must be at least 3 characters");
    }

    #[test]
    fn product_price_must_be_positive() {
        let p = NewProduct {
            title: "Bicycle".into(),
            description: "Mountain bike, 21 gears".into(),
            price: 0,
            image: String::new(),
            whatsapp: String::new(),
        };
        assert_eq!(p.validate().unwrap_err().field, "price");
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        // three characters, six bytes
        assert!(check_title("äöü").is_ok());
        assert!(check_description("short").is_err());
    }

    #[test]
    fn request_budget_is_optional() {
        let r: NewServiceRequest = serde_json::from_str(
            r#"{"title":"Plumber","description":"Leaking tap in kitchen"}"#,
        )
        .unwrap();
        assert_eq!(r.budget, None);
        assert!(r.validate().is_ok());
    }

    #[test]
    fn records_serialize_camel_case_and_hide_hash() {
        let job = Job {
            id: 1,
            title: "Gardener".into(),
            description: "Weekly garden cleanup".into(),
            salary: "R300/day".into(),
            whatsapp: "27987654321".into(),
            employer_id: 7,
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["employerId"], 7);

        let user = User {
            id: 1,
            username: "demo".into(),
            password_hash: "$argon2id$secret".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
    }
}
