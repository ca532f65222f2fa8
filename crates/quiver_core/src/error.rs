//! Geometry error types

use thiserror::Error;

/// Errors raised by geometry operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Curve tolerance must be a finite positive number
    #[error("tolerance must be a finite positive number, got {0}")]
    InvalidTolerance(f64),

    /// A transform collapsed space onto a line or a point
    #[error("transform is not invertible")]
    DegenerateTransform,

    /// A path violated subpath structure
    #[error("invalid path: {0}")]
    InvalidPath(String),
}
