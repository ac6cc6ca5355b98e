//! Error taxonomy for core operations.
//!
//! Every service returns [`CoreError`], a single tagged error whose
//! [`ErrorKind`] decides the HTTP status at the api boundary.

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use validator::ValidationErrors;

use crate::ports::StoreError;

/// Category of a core failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    CapacityExceeded,
    InvalidLocation,
    NotParticipant,
    NotParticipating,
    Validation,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::InvalidLocation => "invalid_location",
            ErrorKind::NotParticipant => "not_participant",
            ErrorKind::NotParticipating => "not_participating",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Internal => "internal_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error returned by every core operation.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Vec<FieldError>,
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn capacity_exceeded() -> Self {
        Self::new(ErrorKind::CapacityExceeded, "Event is at full capacity")
    }

    pub fn invalid_location() -> Self {
        Self::new(
            ErrorKind::InvalidLocation,
            "Latitude and longitude are both required",
        )
    }

    pub fn not_participant() -> Self {
        Self::new(
            ErrorKind::NotParticipant,
            "You are not a participant in this conversation",
        )
    }

    pub fn not_participating() -> Self {
        Self::new(
            ErrorKind::NotParticipating,
            "You are not participating in this event",
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Validation failure carrying per-field details.
    pub fn invalid_fields(details: Vec<FieldError>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: "Validation failed".to_string(),
            details,
        }
    }

    /// Validation failure for a single field.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ErrorKind::Validation,
            message: message.clone(),
            details: vec![FieldError::new(field, message)],
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::internal(err.to_string())
    }
}

/// Flattens validator output into sorted field details.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::invalid_fields(field_errors(&errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(range(min = 2, max = 100))]
        size: i32,
    }

    #[test]
    fn test_kind_codes_are_snake_case() {
        assert_eq!(ErrorKind::CapacityExceeded.code(), "capacity_exceeded");
        assert_eq!(ErrorKind::NotParticipant.code(), "not_participant");
        assert_eq!(ErrorKind::Validation.code(), "validation_error");
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = CoreError::not_found("Event not found");
        assert_eq!(err.to_string(), "not_found: Event not found");
    }

    #[test]
    fn test_store_error_becomes_internal() {
        let err: CoreError = StoreError::Backend("connection reset".into()).into();
        assert!(err.is(ErrorKind::Internal));
    }

    #[test]
    fn test_validation_errors_carry_field_details() {
        let probe = Probe {
            name: String::new(),
            size: 1,
        };
        let err: CoreError = probe.validate().unwrap_err().into();
        assert!(err.is(ErrorKind::Validation));
        assert_eq!(err.details.len(), 2);
        assert_eq!(err.details[0].field, "name");
        assert_eq!(err.details[0].message, "Name is required");
        assert_eq!(err.details[1].field, "size");
    }
}
