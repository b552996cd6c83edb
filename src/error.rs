use thiserror::Error;

/// Errors raised by model parameter setters and computations.
///
/// None of these are fatal: a rejected parameter leaves the previously accepted
/// value in place, and a failed computation leaves the model without a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A degree, window size, order or horizon below its allowed minimum
    #[error("invalid parameter: {name} must be >= 1, got {value}")]
    InvalidParameter {
        /// Name of the rejected parameter
        name: &'static str,
        /// Value that was rejected
        value: usize,
    },

    /// The input series has fewer rows than the chosen parameters require
    #[error("insufficient data: required {required} rows, got {got}")]
    InsufficientData {
        /// Minimum number of rows needed
        required: usize,
        /// Number of rows available
        got: usize,
    },

    /// No input series has been loaded, or the loaded one is empty
    #[error("upstream data unavailable")]
    UpstreamDataUnavailable,

    /// A value could not be represented in the model's float type
    #[error("numerical failure in {model}")]
    Numerical {
        /// Name of the model that failed
        model: &'static str,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, ModelError>;

/// Validates that a model parameter is at least 1
///
/// # Arguments
///
/// * `name` - The parameter name reported on rejection
/// * `value` - The candidate value
///
/// # Returns
///
/// * `Result<usize>` - The value if accepted, `InvalidParameter` otherwise
#[inline]
pub(crate) fn positive(name: &'static str, value: usize) -> Result<usize> {
    if value < 1 {
        Err(ModelError::InvalidParameter { name, value })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_rejects_zero() {
        assert_eq!(
            positive("degree", 0),
            Err(ModelError::InvalidParameter {
                name: "degree",
                value: 0
            })
        );
        assert_eq!(positive("degree", 1), Ok(1));
        assert_eq!(positive("horizon", 42), Ok(42));
    }
}
