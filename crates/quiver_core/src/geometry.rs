//! Geometry primitives: points, sizes, rectangles and bounding boxes
//!
//! All coordinates are `f64`. Conversion to the rasterizer's `f32` happens at
//! the very last moment so that transforms compose without accumulating
//! single-precision error.

use std::ops::{Add, Mul, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Point / Size
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation, `t = 0` yields `self`
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Length of the vector from the origin to this point
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert to a Rect at the origin (0, 0)
    pub const fn to_rect(self) -> Rect {
        Rect {
            origin: Point::ZERO,
            size: self,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rect
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned rectangle with non-negative extent
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Create a rect from two corner points
    pub fn from_points(p1: Point, p2: Point) -> Self {
        let min_x = p1.x.min(p2.x);
        let min_y = p1.y.min(p2.y);
        let max_x = p1.x.max(p2.x);
        let max_y = p1.y.max(p2.y);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Create a rect from its min/max edges
    pub fn from_ltrb(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Rect::from_points(Point::new(left, top), Point::new(right, bottom))
    }

    pub fn x(&self) -> f64 {
        self.origin.x
    }

    pub fn y(&self) -> f64 {
        self.origin.y
    }

    pub fn width(&self) -> f64 {
        self.size.width
    }

    pub fn height(&self) -> f64 {
        self.size.height
    }

    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.x <= self.right()
            && point.y >= self.origin.y
            && point.y <= self.bottom()
    }

    /// Get the union of two rects (smallest rect containing both)
    pub fn union(&self, other: &Rect) -> Self {
        Rect::from_ltrb(
            self.x().min(other.x()),
            self.y().min(other.y()),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Overlapping region, `None` when the rects are disjoint
    ///
    /// Rects that only touch along an edge yield a zero-area intersection.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x().max(other.x());
        let top = self.y().max(other.y());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left > right || top > bottom {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Expand rect to include a point
    pub fn expand_to_include(&self, point: Point) -> Self {
        Rect::from_ltrb(
            self.x().min(point.x),
            self.y().min(point.y),
            self.right().max(point.x),
            self.bottom().max(point.y),
        )
    }

    /// Snap outward to whole units: floor the origin, ceil the far edges
    pub fn round_out(&self) -> Self {
        Rect::from_ltrb(
            self.x().floor(),
            self.y().floor(),
            self.right().ceil(),
            self.bottom().ceil(),
        )
    }

    /// The four corners, clockwise from the origin
    pub fn corners(&self) -> [Point; 4] {
        [
            self.origin,
            Point::new(self.right(), self.y()),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x(), self.bottom()),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.size.width.is_finite() && self.size.height.is_finite()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bounding box
// ─────────────────────────────────────────────────────────────────────────────

/// Bounding box of painted content
///
/// `Empty` means nothing contributed. It is deliberately a separate state
/// rather than a zero-sized rect at the origin, which is a legitimate box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum BBox {
    #[default]
    Empty,
    Bounds(Rect),
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BBox::Bounds(Rect::new(x, y, width, height))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BBox::Empty)
    }

    pub fn rect(&self) -> Option<Rect> {
        match self {
            BBox::Empty => None,
            BBox::Bounds(rect) => Some(*rect),
        }
    }

    /// Union; `Empty` is the identity element
    pub fn union(self, other: BBox) -> BBox {
        match (self, other) {
            (BBox::Empty, b) | (b, BBox::Empty) => b,
            (BBox::Bounds(a), BBox::Bounds(b)) => BBox::Bounds(a.union(&b)),
        }
    }

    pub fn include_point(self, point: Point) -> BBox {
        match self {
            BBox::Empty => BBox::Bounds(Rect::new(point.x, point.y, 0.0, 0.0)),
            BBox::Bounds(rect) => BBox::Bounds(rect.expand_to_include(point)),
        }
    }

    /// Clip to `clip`; a box entirely outside becomes `Empty`
    pub fn intersect(self, clip: &Rect) -> BBox {
        match self {
            BBox::Empty => BBox::Empty,
            BBox::Bounds(rect) => rect.intersection(clip).map_or(BBox::Empty, BBox::Bounds),
        }
    }
}

impl From<Rect> for BBox {
    fn from(rect: Rect) -> Self {
        BBox::Bounds(rect)
    }
}

impl FromIterator<Point> for BBox {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BBox::Empty, |bbox, point| bbox.include_point(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_union_and_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 10.0, 10.0);

        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 15.0, 15.0));
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 0.0, 5.0, 5.0)));
        assert_eq!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)), None);
    }

    #[test]
    fn test_round_out() {
        let r = Rect::new(0.5, 1.2, 10.1, 3.3).round_out();
        assert_eq!(r, Rect::new(0.0, 1.0, 11.0, 4.0));
    }

    #[test]
    fn test_bbox_empty_is_union_identity() {
        let b = BBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(BBox::Empty.union(b), b);
        assert_eq!(b.union(BBox::Empty), b);
        assert!(BBox::Empty.union(BBox::Empty).is_empty());
    }

    #[test]
    fn test_bbox_empty_differs_from_zero_rect() {
        assert_ne!(BBox::Empty, BBox::Bounds(Rect::ZERO));
        let single: BBox = [Point::ZERO].into_iter().collect();
        assert_eq!(single, BBox::Bounds(Rect::ZERO));
    }

    #[test]
    fn test_bbox_intersect_disjoint_is_empty() {
        let b = BBox::new(100.0, 100.0, 5.0, 5.0);
        assert!(b.intersect(&Rect::new(0.0, 0.0, 10.0, 10.0)).is_empty());
    }
}
