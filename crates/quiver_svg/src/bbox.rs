//! Bounds of painted content
//!
//! Fills contribute the tight extent of their path segments. Strokes are
//! expanded into a fill outline in local space (dashes, caps and joins
//! included), mapped to canvas space and measured the same way.

use quiver_core::{BBox, Path, Transform};

use crate::document::{Document, ShapeInstance};
use crate::path::{from_skia_path, to_skia_path};
use crate::style::StrokeStyle;

impl Document {
    /// Bounds of visible content, clipped to the canvas when one is set
    pub fn compute_bbox(&self) -> BBox {
        let content = self.content_bbox();
        match self.canvas {
            Some(canvas) => content.intersect(&canvas.to_rect()),
            None => content,
        }
    }

    /// Bounds of all painted content in canvas space, unclipped
    pub fn content_bbox(&self) -> BBox {
        self.shapes()
            .iter()
            .map(shape_bbox)
            .fold(BBox::Empty, BBox::union)
    }
}

fn shape_bbox(instance: &ShapeInstance<'_>) -> BBox {
    if instance.opacity <= 0.0 {
        return BBox::Empty;
    }
    let style = &instance.shape.style;
    let path = &instance.shape.path;

    let mut bbox = BBox::Empty;
    if style.visible_fill().is_some() {
        bbox = bbox.union(segment_bounds(&path.transformed(&instance.transform)));
    }
    if let Some(stroke) = style.visible_stroke() {
        if let Some(outline) = stroke_outline(path, stroke, &instance.transform) {
            bbox = bbox.union(segment_bounds(&outline.transformed(&instance.transform)));
        }
    }
    bbox
}

/// Extent of the drawn segments, ignoring isolated move-tos
fn segment_bounds(path: &Path) -> BBox {
    path.segments()
        .fold(BBox::Empty, |bbox, seg| bbox.union(seg.bounds().into()))
}

/// Fill outline of `stroke` applied to `path`, in the path's local space
fn stroke_outline(path: &Path, stroke: &StrokeStyle, ts: &Transform) -> Option<Path> {
    let skia_path = to_skia_path(path)?;
    let skia_stroke = stroke.to_skia();
    let res_scale = resolution_scale(ts);

    let dashed;
    let source = match &skia_stroke.dash {
        Some(dash) => {
            dashed = skia_path.dash(dash, res_scale)?;
            &dashed
        }
        None => &skia_path,
    };
    let outline = source.stroke(&skia_stroke, res_scale)?;
    Some(from_skia_path(&outline))
}

/// Largest axis scale of `ts`, so outlines are tessellated finely enough
/// for the space they are measured in
fn resolution_scale(ts: &Transform) -> f32 {
    let [a, b, c, d, _, _] = ts.elements;
    let scale = a.hypot(b).max(c.hypot(d));
    if scale.is_finite() && scale > 0.0 {
        scale as f32
    } else {
        1.0
    }
}
