//! Rasterization with tiny-skia
//!
//! Shapes are painted in document order with source-over compositing, fill
//! before stroke. Nodes with opacity below 1 are drawn into an isolated layer
//! first and composited with that opacity.

use quiver_core::Transform;
use tiny_skia::{Pixmap, PixmapPaint};
use tracing::debug;

use crate::config::RenderOptions;
use crate::document::{Document, NodeId, NodeKind, Shape};
use crate::error::{Result, SvgError};
use crate::path::{to_skia_path, to_skia_transform};
use crate::style::{skia_fill_rule, skia_paint};

/// Rasterized document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// RGBA pixel data (straight alpha), row-major
    pub pixels: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Bitmap {
    /// RGBA of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + x as usize) * 4;
        self.pixels
            .get(i..i + 4)
            .and_then(|px| px.try_into().ok())
    }

    /// Get the dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Document {
    /// Render at `scale` pixels per canvas unit and encode as PNG
    pub fn render(&self, scale: f64) -> Result<Vec<u8>> {
        self.render_with(&RenderOptions::new().with_scale(scale))
    }

    /// Render with explicit options and encode as PNG
    pub fn render_with(&self, options: &RenderOptions) -> Result<Vec<u8>> {
        let pixmap = self.render_pixmap(options)?;
        pixmap
            .encode_png()
            .map_err(|e| SvgError::Render(format!("PNG encoding failed: {e}")))
    }

    /// Render into a straight-alpha RGBA bitmap
    pub fn rasterize(&self, options: &RenderOptions) -> Result<Bitmap> {
        let pixmap = self.render_pixmap(options)?;
        Ok(Bitmap {
            pixels: unpremultiply_alpha(pixmap.data()),
            width: pixmap.width(),
            height: pixmap.height(),
        })
    }

    fn render_pixmap(&self, options: &RenderOptions) -> Result<Pixmap> {
        let canvas = self
            .canvas
            .ok_or_else(|| SvgError::Render("document has no canvas size".into()))?;
        let scale = options.resolve_scale(canvas)?;

        let width = (canvas.width * scale).round();
        let height = (canvas.height * scale).round();
        if width < 1.0 || height < 1.0 {
            return Err(SvgError::Render(format!(
                "{}x{} at scale {scale} rounds to an empty bitmap",
                canvas.width, canvas.height
            )));
        }
        if width > u32::MAX as f64 || height > u32::MAX as f64 {
            return Err(SvgError::Render(format!(
                "bitmap size {width}x{height} is too large"
            )));
        }
        let (width, height) = (width as u32, height as u32);
        let pixels = width as u64 * height as u64;
        if let Some(limit) = self.config.max_canvas_pixels {
            if pixels > limit {
                return Err(SvgError::Render(format!(
                    "bitmap of {width}x{height} exceeds the {limit} pixel limit"
                )));
            }
        }

        debug!("rendering {}x{} at scale {}", width, height, scale);

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| SvgError::Render("Failed to create pixmap".into()))?;
        if let Some(background) = options.background {
            pixmap.fill(background.to_skia(1.0));
        }

        let base = Transform::scale(scale, scale).then(&self.root_transform);
        self.render_node(self.root, &base, 0, &mut pixmap)?;
        Ok(pixmap)
    }

    fn render_node(
        &self,
        id: NodeId,
        parent_ts: &Transform,
        layers: u64,
        target: &mut Pixmap,
    ) -> Result<()> {
        let node = &self.nodes[id];
        if node.opacity <= 0.0 {
            return Ok(());
        }
        let ts = parent_ts.then(&node.transform);

        if node.opacity >= 1.0 {
            return self.render_content(id, &ts, layers, target);
        }
        // A single paint needs no isolation, its alpha carries the opacity
        if let NodeKind::Shape(shape) = &node.kind {
            let style = &shape.style;
            if style.visible_fill().is_none() || style.visible_stroke().is_none() {
                self.draw_shape(shape, &ts, node.opacity, target);
                return Ok(());
            }
        }

        let live = target.width() as u64 * target.height() as u64 * (layers + 2);
        if let Some(limit) = self.config.max_canvas_pixels {
            if live > limit {
                return Err(SvgError::Render(format!(
                    "{} nested opacity layers exceed the {limit} pixel limit",
                    layers + 1
                )));
            }
        }
        let mut layer = Pixmap::new(target.width(), target.height())
            .ok_or_else(|| SvgError::Render("Failed to create layer".into()))?;
        self.render_content(id, &ts, layers + 1, &mut layer)?;
        let paint = PixmapPaint {
            opacity: node.opacity as f32,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(
            0,
            0,
            layer.as_ref(),
            &paint,
            tiny_skia::Transform::identity(),
            None,
        );
        Ok(())
    }

    fn render_content(
        &self,
        id: NodeId,
        ts: &Transform,
        layers: u64,
        target: &mut Pixmap,
    ) -> Result<()> {
        match &self.nodes[id].kind {
            NodeKind::Group => {
                for &child in &self.nodes[id].children {
                    self.render_node(child, ts, layers, target)?;
                }
            }
            NodeKind::Shape(shape) => self.draw_shape(shape, ts, 1.0, target),
        }
        Ok(())
    }

    fn draw_shape(&self, shape: &Shape, ts: &Transform, opacity: f64, target: &mut Pixmap) {
        let Some(path) = to_skia_path(&shape.path) else {
            return;
        };
        let transform = to_skia_transform(ts);
        let anti_alias = self.config.anti_alias;

        if let Some(fill) = shape.style.visible_fill() {
            let paint = skia_paint(fill.color, fill.opacity * opacity, anti_alias);
            target.fill_path(&path, &paint, skia_fill_rule(fill.rule), transform, None);
        }
        if let Some(stroke) = shape.style.visible_stroke() {
            let paint = skia_paint(stroke.color, stroke.opacity * opacity, anti_alias);
            target.stroke_path(&path, &paint, &stroke.to_skia(), transform, None);
        }
    }
}

/// Convert premultiplied alpha to straight alpha
///
/// tiny-skia stores premultiplied pixels; `Bitmap` consumers expect straight
/// alpha, the same layout PNG encoding produces.
fn unpremultiply_alpha(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());

    for chunk in data.chunks_exact(4) {
        let a = chunk[3];
        if a == 0 {
            result.extend_from_slice(&[0, 0, 0, 0]);
        } else {
            let unpremultiply = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
            result.extend_from_slice(&[
                unpremultiply(chunk[0]),
                unpremultiply(chunk[1]),
                unpremultiply(chunk[2]),
                a,
            ]);
        }
    }

    result
}
