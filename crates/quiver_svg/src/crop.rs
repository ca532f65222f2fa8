//! Viewport cropping

use quiver_core::{BBox, GeometryError, Size};
use tracing::debug;

use crate::document::Document;
use crate::error::{Result, SvgError};

impl Document {
    /// Make `bbox` the new canvas
    ///
    /// Content inside the box maps to `[0, width] × [0, height]`. Geometry is
    /// left untouched, including anything now outside the canvas.
    pub fn crop(&mut self, bbox: impl Into<BBox>) -> Result<()> {
        let rect = match bbox.into() {
            BBox::Empty => {
                return Err(SvgError::Input(
                    "cannot crop to an empty bounding box".into(),
                ))
            }
            BBox::Bounds(rect) => rect,
        };
        if !rect.is_finite() {
            return Err(SvgError::Input(format!(
                "crop box must be finite, got {rect:?}"
            )));
        }
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(SvgError::Input(format!(
                "crop box must have positive size, got {}x{}",
                rect.width(),
                rect.height()
            )));
        }

        let root_transform = self.root_transform.post_translate(-rect.x(), -rect.y());
        if !root_transform.is_invertible() {
            return Err(GeometryError::DegenerateTransform.into());
        }

        debug!(
            "cropping to {}x{} at ({}, {})",
            rect.width(),
            rect.height(),
            rect.x(),
            rect.y()
        );
        self.root_transform = root_transform;
        self.canvas = Some(Size::new(rect.width(), rect.height()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;
    use quiver_core::{Path, Rect, Transform};

    fn doc_with_square() -> Document {
        let mut doc = Document::new(100.0, 100.0).unwrap();
        doc.add_shape(
            doc.root(),
            Path::rect(Rect::new(20.0, 30.0, 10.0, 15.0)),
            Style::default(),
        )
        .unwrap();
        doc
    }

    #[test]
    fn test_crop_to_bbox_moves_content_to_origin() {
        let mut doc = doc_with_square();
        let bbox = doc.compute_bbox();
        doc.crop(bbox).unwrap();

        assert_eq!(doc.canvas(), Some(Size::new(10.0, 15.0)));
        let cropped = doc.compute_bbox().rect().unwrap();
        assert!(cropped.x().abs() < 1e-9 && cropped.y().abs() < 1e-9);
        assert!((cropped.width() - 10.0).abs() < 1e-9);
        assert!((cropped.height() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_crop_rejects_bad_boxes() {
        let mut doc = doc_with_square();
        for bbox in [
            BBox::Empty,
            BBox::new(0.0, 0.0, 0.0, 10.0),
            BBox::new(0.0, 0.0, 10.0, -1.0),
            BBox::new(f64::NAN, 0.0, 10.0, 10.0),
            BBox::new(0.0, 0.0, f64::INFINITY, 10.0),
        ] {
            assert!(matches!(doc.crop(bbox), Err(SvgError::Input(_))), "{bbox:?}");
        }
        assert_eq!(doc.canvas(), Some(Size::new(100.0, 100.0)));
        assert!(doc.root_transform().is_identity());
    }

    #[test]
    fn test_crop_overflow_leaves_document_untouched() {
        let mut doc = doc_with_square();
        let far = Rect::new(-f64::MAX, 0.0, 1.0, 1.0);
        doc.crop(far).unwrap();
        let before = (doc.canvas(), doc.root_transform());

        let err = doc.crop(far).unwrap_err();
        assert!(matches!(err, SvgError::Geometry(GeometryError::DegenerateTransform)));
        assert_eq!((doc.canvas(), doc.root_transform()), before);
    }

    #[test]
    fn test_crop_composes_with_root_transform() {
        let mut doc = doc_with_square();
        doc.root_transform = Transform::scale(2.0, 2.0);
        doc.crop(Rect::new(40.0, 60.0, 20.0, 30.0)).unwrap();
        let bbox = doc.compute_bbox().rect().unwrap();
        assert!(bbox.x().abs() < 1e-9 && bbox.y().abs() < 1e-9);
        assert!((bbox.width() - 20.0).abs() < 1e-9);
    }
}
