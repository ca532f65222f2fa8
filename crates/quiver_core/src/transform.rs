//! 2D affine transforms

use crate::error::GeometryError;
use crate::geometry::{Point, Rect};

/// Determinants at or below this magnitude are treated as singular
const DEGENERATE_EPSILON: f64 = 1e-12;

/// 2×3 affine matrix
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0   1 |
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Matrix elements [a, b, c, d, tx, ty]
    pub elements: [f64; 6],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self {
            elements: [a, b, c, d, tx, ty],
        }
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `angle` radians
    pub fn rotation(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    pub fn skew(skew_x: f64, skew_y: f64) -> Self {
        Self::new(1.0, skew_y.tan(), skew_x.tan(), 1.0, 0.0, 0.0)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn determinant(&self) -> f64 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    pub fn is_finite(&self) -> bool {
        self.elements.iter().all(|v| v.is_finite())
    }

    pub fn is_invertible(&self) -> bool {
        self.is_finite() && self.determinant().abs() > DEGENERATE_EPSILON
    }

    /// True when the transform only scales and translates
    pub fn is_axis_aligned(&self) -> bool {
        let [_, b, c, _, _, _] = self.elements;
        b == 0.0 && c == 0.0
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Transform) -> Transform {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        Transform {
            elements: [
                a1 * a2 + c1 * b2,
                b1 * a2 + d1 * b2,
                a1 * c2 + c1 * d2,
                b1 * c2 + d1 * d2,
                a1 * tx2 + c1 * ty2 + tx1,
                b1 * tx2 + d1 * ty2 + ty1,
            ],
        }
    }

    /// Apply a translation after this transform
    pub fn post_translate(&self, x: f64, y: f64) -> Transform {
        Transform::translation(x, y).then(self)
    }

    pub fn inverse(&self) -> Result<Transform, GeometryError> {
        if !self.is_invertible() {
            return Err(GeometryError::DegenerateTransform);
        }
        let [a, b, c, d, tx, ty] = self.elements;
        let inv_det = 1.0 / self.determinant();
        Ok(Transform::new(
            d * inv_det,
            -b * inv_det,
            -c * inv_det,
            a * inv_det,
            (c * ty - d * tx) * inv_det,
            (b * tx - a * ty) * inv_det,
        ))
    }

    /// Axis-aligned bounds of a transformed rect
    ///
    /// Exact for rectangles: the image of a rect is a parallelogram whose
    /// extremes are its corners.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let [p0, p1, p2, p3] = rect.corners().map(|p| self.transform_point(p));
        Rect::from_ltrb(
            p0.x.min(p1.x).min(p2.x).min(p3.x),
            p0.y.min(p1.y).min(p2.y).min(p3.y),
            p0.x.max(p1.x).max(p2.x).max(p3.x),
            p0.y.max(p1.y).max(p2.y).max(p3.y),
        )
    }

    /// Geometric mean of the axis scale factors, used to size stroke
    /// tessellation for a given output resolution
    pub fn mean_scale(&self) -> f64 {
        self.determinant().abs().sqrt()
    }
}
