//! Error types for modeladmin.
//!
//! [`AdminError`] covers every failure an admin request can run into: missing
//! records, disabled operations, form validation, engine failures, template
//! rendering, and configuration problems. Each variant maps to an HTTP status
//! code via [`AdminError::status_code`].

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// A form validation failure, with optional per-field messages.
///
/// # Examples
///
/// ```
/// use modeladmin_core::error::ValidationError;
///
/// let mut err = ValidationError::default();
/// err.add("name", "This field is required.");
/// assert!(err.has_errors());
/// assert_eq!(err.field("name"), ["This field is required."]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    /// Errors not tied to a single field.
    pub message: Option<String>,
    /// Per-field messages keyed by form field name.
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationError {
    /// Creates a validation error with a single non-field message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            field_errors: BTreeMap::new(),
        }
    }

    /// Records a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for a field.
    pub fn field(&self, field: &str) -> &[String] {
        self.field_errors.get(field).map_or(&[], Vec::as_slice)
    }

    /// Returns whether anything was recorded.
    pub fn has_errors(&self) -> bool {
        self.message.is_some() || !self.field_errors.is_empty()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        if let Some(message) = &self.message {
            write!(f, "{message}")?;
            first = false;
        }
        for (field, errors) in &self.field_errors {
            for error in errors {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {error}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for modeladmin.
#[derive(Error, Debug)]
pub enum AdminError {
    /// The requested view or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is disabled for this view.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The request was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Submitted form data failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// The engine failed to run a query.
    #[error("Database error: {0}")]
    Database(String),

    /// A setting is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A template failed to parse or render.
    #[error("Template error: {0}")]
    Template(String),

    /// A value could not be converted to or from its record form.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Returns the HTTP status code associated with this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => 400,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::Database(_)
            | Self::Configuration(_)
            | Self::Template(_)
            | Self::Serialization(_)
            | Self::Io(_) => 500,
        }
    }
}

impl From<ValidationError> for AdminError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, AdminError>`.
pub type AdminResult<T> = Result<T, AdminError>;
