//! Error types for coordinate and ROI arithmetic.

use thiserror::Error;

use crate::Coordinate;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised by exact integer grid arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// An elementwise division left a nonzero remainder where exactness
    /// is required.
    #[error("{value} is not exactly divisible by {divisor}")]
    NotDivisible {
        value: Coordinate,
        divisor: Coordinate,
    },

    /// A divisor or grid step has a component that is zero or negative.
    #[error("divisor {divisor} has a non-positive component")]
    NonPositiveDivisor { divisor: Coordinate },

    /// A ROI shape has a negative component.
    #[error("shape {shape} has a negative component")]
    NegativeShape { shape: Coordinate },
}
