//! Error types for Open House Core

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::auth::AuthError;

/// Form fields that can carry a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Phone,
    DoNotCall,
    HasAgencyAgreement,
    BrokerName,
    CompanyName,
    PropertyName,
    Password,
}

impl Field {
    /// Wire name of the field, matching the record's camelCase keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::DoNotCall => "doNotCall",
            Field::HasAgencyAgreement => "hasAgencyAgreement",
            Field::BrokerName => "brokerName",
            Field::CompanyName => "companyName",
            Field::PropertyName => "name",
            Field::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-scoped validation messages, reported together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message for a field wins.
    pub fn add(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn single(field: Field, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// `Ok(())` when nothing was recorded, otherwise `Error::Validation`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Settings payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid link: {0}")]
    InvalidLink(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::ImageDecode(e.to_string())
    }
}

impl Error {
    /// Stable machine-readable code for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION",
            Error::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            Error::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Error::ImageDecode(_) => "IMAGE_DECODE",
            Error::InvariantViolation(_) => "INVARIANT_VIOLATION",
            Error::Auth(_) => "AUTH",
            Error::NotFound(_) => "NOT_FOUND",
            Error::InvalidLink(_) => "INVALID_LINK",
            Error::BackendUnavailable(_)
            | Error::Database(_)
            | Error::Io(_)
            | Error::Serialization(_) => "BACKEND_UNAVAILABLE",
        }
    }

    /// Message suitable for showing to the person who triggered the operation
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(errors) => format!("Please correct the following: {}", errors),
            Error::DuplicateEmail(_) => "This email is already registered".to_string(),
            Error::PayloadTooLarge { size, limit } => format!(
                "Settings are too large to save ({} KB, limit {} KB). Please use smaller images.",
                size / 1024,
                limit / 1024
            ),
            Error::ImageDecode(_) => {
                "That image could not be processed. Please choose a different file.".to_string()
            }
            Error::InvariantViolation(message) => message.clone(),
            Error::Auth(e) => e.user_message().to_string(),
            Error::NotFound(what) => format!("Could not find {}.", what),
            Error::InvalidLink(_) => "This registration link is not valid.".to_string(),
            Error::BackendUnavailable(_)
            | Error::Database(_)
            | Error::Io(_)
            | Error::Serialization(_) => {
                "Something went wrong while saving or loading data. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_all_fields() {
        let mut errors = ValidationErrors::new();
        errors.add(Field::Email, "Email is required");
        errors.add(Field::FirstName, "First name is required");
        errors.add(Field::Email, "Please enter a valid email");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(
            errors.to_string(),
            "firstName: First name is required; email: Email is required"
        );
    }

    #[test]
    fn test_empty_validation_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_backend_kinds_share_code() {
        let err = Error::Database(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.kind(), "BACKEND_UNAVAILABLE");
        assert_eq!(
            Error::BackendUnavailable("x".into()).user_message(),
            err.user_message()
        );
    }

    #[test]
    fn test_payload_message_mentions_images() {
        let err = Error::PayloadTooLarge {
            size: 1_000_000,
            limit: 921_600,
        };
        assert_eq!(err.kind(), "PAYLOAD_TOO_LARGE");
        assert!(err.user_message().contains("smaller images"));
    }
}
