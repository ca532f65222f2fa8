//! SVG documents for Quiver
//!
//! This crate loads a practical SVG subset into an editable [`Document`] and
//! offers the operations built on top of it:
//!
//! - **Parsing** with `roxmltree` and `svgtypes` into an arena of groups and shapes
//! - **Simplification** of cubic curves into quadratics within a tolerance
//! - **Bounds** of painted content, strokes included
//! - **Cropping** the canvas to a box
//! - **Rasterization** with `tiny-skia`, to a [`Bitmap`] or PNG bytes
//! - **Serialization** back to SVG text
//!
//! # Example
//!
//! ```rust
//! use quiver_svg::Document;
//!
//! let mut doc = Document::parse(
//!     r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
//!          <path d="M 20 80 C 20 20 80 20 80 80" stroke="black" fill="none"/>
//!        </svg>"#,
//! )?;
//!
//! doc.simplify_curves(0.1)?;
//! let bbox = doc.compute_bbox();
//! doc.crop(bbox)?;
//! let png = doc.render(2.0)?;
//! assert!(png.starts_with(b"\x89PNG"));
//! # Ok::<(), quiver_svg::SvgError>(())
//! ```

mod bbox;
mod config;
mod crop;
mod document;
mod error;
mod parser;
mod path;
mod rasterize;
mod style;
mod writer;

pub use config::{DocumentConfig, RenderOptions};
pub use document::{Document, Node, NodeId, NodeKind, Shape, ShapeInstance};
pub use error::{Result, SvgError};
pub use rasterize::Bitmap;
pub use style::{Color, Dash, Fill, FillRule, LineCap, LineJoin, StrokeStyle, Style};

pub use quiver_core::{BBox, Path, PathCommand, Point, Rect, SimplifyReport, Size, Transform};
