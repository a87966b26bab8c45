//! Error types for the herald-common crate.

use thiserror::Error;

/// Errors raised while preparing or validating an [`Email`](crate::Email).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailError {
    /// One or more fields failed validation. Each entry is `path: message`.
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

impl EmailError {
    /// The individual `path: message` entries of a validation failure.
    pub fn violations(&self) -> &[String] {
        match self {
            Self::Validation(violations) => violations,
        }
    }
}

impl From<garde::Report> for EmailError {
    fn from(report: garde::Report) -> Self {
        Self::Validation(
            report
                .iter()
                .map(|(path, error)| {
                    let path = path.to_string();
                    if path.is_empty() {
                        error.message().to_string()
                    } else {
                        format!("{path}: {}", error.message())
                    }
                })
                .collect(),
        )
    }
}

/// Errors raised while building a [`PaginationQuery`](crate::PaginationQuery)
/// from untrusted input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}
