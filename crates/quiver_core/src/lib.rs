//! Quiver Core Geometry
//!
//! This crate provides the geometric foundation for the Quiver vector engine:
//!
//! - **Primitives**: [`Point`], [`Size`], [`Rect`] and the [`BBox`] accumulator
//! - **Transforms**: 2×3 affine [`Transform`] with composition and inversion
//! - **Paths**: [`Path`] as a list of [`PathCommand`]s, resolved into
//!   [`Segment`]s with tight bounds
//! - **Simplification**: cubic → quadratic conversion with a bounded error
//!
//! # Example
//!
//! ```rust
//! use quiver_core::{Path, PathCommand, SimplifyOptions};
//!
//! let mut path = Path::new()
//!     .move_to(0.0, 0.0)
//!     .cubic_to(0.0, 10.0, 10.0, 10.0, 10.0, 0.0);
//!
//! let report = path.simplify_cubics(&SimplifyOptions::new(0.01)).unwrap();
//! assert!(!path.has_cubics());
//! assert!(report.quads_emitted >= 1);
//! assert!(matches!(path.commands()[1], PathCommand::QuadTo { .. }));
//! ```

pub mod bezier;
pub mod error;
pub mod geometry;
pub mod path;
pub mod simplify;
pub mod transform;

pub use bezier::{CubicBez, LineSeg, QuadBez};
pub use error::GeometryError;
pub use geometry::{BBox, Point, Rect, Size};
pub use path::{Path, PathCommand, Segment, Segments};
pub use simplify::{
    cubic_to_quads, Approximation, SimplifyOptions, SimplifyReport, DEFAULT_MAX_DEPTH,
};
pub use transform::Transform;
