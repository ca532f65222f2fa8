//! SVG error types

use quiver_core::GeometryError;
use thiserror::Error;

/// Errors that can occur when loading, editing or rendering SVG documents
#[derive(Error, Debug)]
pub enum SvgError {
    /// Malformed source text
    #[error("SVG parsing error at {line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    /// Caller-supplied value out of range (tolerance, scale, crop box, ...)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Geometry invariant violation detected at an operation boundary
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Rasterization or encoding failure
    #[error("Render error: {0}")]
    Render(String),
}

impl SvgError {
    pub(crate) fn parse_at(pos: roxmltree::TextPos, message: impl Into<String>) -> Self {
        SvgError::Parse {
            line: pos.row,
            column: pos.col,
            message: message.into(),
        }
    }
}

/// Result type for quiver_svg operations
pub type Result<T> = std::result::Result<T, SvgError>;
