//! Validation errors for order requests.

use std::fmt;

/// Errors returned by validated request constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidationError {
    /// EUR amount must be greater than zero.
    NonPositiveAmount,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonPositiveAmount => {
                write!(f, "amount must be greater than zero")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
