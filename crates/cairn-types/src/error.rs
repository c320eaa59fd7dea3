use thiserror::Error;

/// Validation errors produced while converting or setting typed values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp { input: String, reason: String },

    #[error("identifier must be a scalar value, got {0}")]
    NonScalarId(String),

    #[error("invalid value for field '{field}': expected {expected}")]
    InvalidField { field: String, expected: &'static str },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TypeError {
    /// Shorthand for [`TypeError::InvalidField`].
    pub fn field(field: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected,
        }
    }
}

/// Result alias for type conversions.
pub type TypeResult<T> = Result<T, TypeError>;
