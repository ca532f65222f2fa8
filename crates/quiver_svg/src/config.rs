//! Document and render configuration

use quiver_core::{Size, DEFAULT_MAX_DEPTH};

use crate::error::{Result, SvgError};
use crate::style::Color;

/// Per-document limits and quality settings
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentConfig {
    /// Refuse to allocate bitmaps with more pixels than this
    pub max_canvas_pixels: Option<u64>,
    /// Anti-alias fills and strokes
    pub anti_alias: bool,
    /// Subdivision depth limit for cubic → quadratic conversion
    pub max_subdivision_depth: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_canvas_pixels: Some(1 << 28),
            anti_alias: true,
            max_subdivision_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Options for a single render call
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Pixels per document unit, applied to both axes
    pub scale: f64,
    /// Derive the scale so the bitmap is this many pixels wide
    pub fit_width: Option<u32>,
    /// Opaque color painted under the content
    pub background: Option<Color>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            fit_width: None,
            background: None,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_fit_width(mut self, width: u32) -> Self {
        self.fit_width = Some(width);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Effective scale for a canvas of `canvas` document units
    pub(crate) fn resolve_scale(&self, canvas: Size) -> Result<f64> {
        let scale = match self.fit_width {
            Some(0) => return Err(SvgError::Input("fit width must be positive".into())),
            Some(width) => width as f64 / canvas.width,
            None => self.scale,
        };
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SvgError::Input(format!(
                "scale must be a finite positive number, got {scale}"
            )));
        }
        Ok(scale)
    }
}
