//! Error types for erasure coding operations

use thiserror::Error;

/// Result type for erasure coding operations
pub type FecResult<T> = Result<T, FecError>;

/// Errors that can occur while building or running a codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FecError {
    /// Construction parameter or call argument outside the supported range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Inverse (or division) of the additive identity in a field
    #[error("Division by zero in field arithmetic")]
    FieldDivideByZero,

    /// Polynomial long division by the zero polynomial
    #[error("Polynomial division by the zero polynomial")]
    DivideByZero,

    /// Gaussian elimination found no pivot
    #[error("Matrix is singular at column {column}")]
    SingularMatrix { column: usize },

    /// Decode phases were driven in the wrong order
    #[error("Logic error: {0}")]
    Logic(String),

    /// Decode phase that the codec does not support
    #[error("{operation} is not applicable to the {codec} codec")]
    NotApplicable {
        operation: &'static str,
        codec: &'static str,
    },

    /// Fewer surviving fragments than data fragments
    #[error("Cannot decode: {needed} fragments required but only {available} available")]
    NotEnoughFragments { needed: usize, available: usize },
}

impl FecError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FecError::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = FecError::NotApplicable {
            operation: "decode_add_data",
            codec: "RsNf4",
        };
        assert_eq!(
            err.to_string(),
            "decode_add_data is not applicable to the RsNf4 codec"
        );

        let err = FecError::NotEnoughFragments {
            needed: 4,
            available: 3,
        };
        assert!(err.to_string().contains("4 fragments required"));
    }

    #[test]
    fn divide_by_zero_variants_are_distinct() {
        assert_ne!(FecError::DivideByZero, FecError::FieldDivideByZero);
    }
}
