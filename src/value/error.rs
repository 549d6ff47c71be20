//! Value-layer error types
//!
//! Defines all error conditions that can occur when operating on the
//! Scalar/Number/Series value algebra, including reduction and resampling.

use thiserror::Error;

/// Errors that can occur when operating on values
#[derive(Error, Debug)]
pub enum ValueError {
    /// An operation was applied to the wrong kind of value
    #[error("type mismatch: {operation} requires {expected}, got {found}")]
    TypeMismatch {
        /// The operation that was attempted
        operation: &'static str,
        /// The value kind the operation requires
        expected: &'static str,
        /// The value kind that was actually supplied
        found: &'static str,
    },

    /// Reducer name not in the fixed reducer table
    #[error("reduction '{0}' is not implemented")]
    UnknownReducer(String),

    /// Downsampling or upsampling method not in the fixed method tables
    #[error("resampling method '{0}' is not implemented")]
    UnknownResampleMethod(String),

    /// Resample rule string did not match `^(\d*)(alias)$`
    #[error("resample rule '{0}' is not implemented")]
    InvalidResampleRule(String),

    /// The query time range is shorter than one resample bucket
    #[error("cannot resample series '{series}': the time range is shorter than the interval")]
    RangeTooShort {
        /// Name of the series being resampled
        series: String,
    },

    /// A null timestamp was used where a concrete one is required
    #[error("series '{series}' has a null timestamp where a concrete one is required")]
    NullTimestamp {
        /// Name of the offending series
        series: String,
    },

    /// A null timestamp was pushed onto a series declared non-nullable
    #[error("cannot set a null time value on the non-nullable time field of series '{series}'")]
    NullTimeNotAllowed {
        /// Name of the offending series
        series: String,
    },

    /// A source frame's column lengths disagree
    #[error("frame '{frame}' column '{column}' has {got} values for {expected} timestamps")]
    ColumnLengthMismatch {
        /// Name of the source frame
        frame: String,
        /// Name of the offending value column
        column: String,
        /// Number of timestamps in the frame
        expected: usize,
        /// Number of values in the column
        got: usize,
    },
}

/// Result type alias for value operations
pub type ValueResult<T> = Result<T, ValueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValueError::UnknownReducer("p99".to_string());
        assert_eq!(err.to_string(), "reduction 'p99' is not implemented");

        let err = ValueError::RangeTooShort {
            series: "temp".to_string(),
        };
        assert!(err.to_string().contains("shorter than the interval"));
    }
}
