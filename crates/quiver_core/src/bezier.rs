//! Quadratic and cubic Bézier segments
//!
//! Tight bounds come from the curve's axis extrema, the parameters where
//! one coordinate's derivative vanishes. Control points alone are not used
//! as a bound; they may lie well outside the curve.

use smallvec::SmallVec;

use crate::geometry::{BBox, Point, Rect};
use crate::transform::Transform;

/// Maximum parametric distance between a cubic and its single-quadratic
/// degree reduction is `|p3 - 3c2 + 3c1 - p0| * DEGREE_REDUCTION_ERROR`.
///
/// The difference of the two curves is `A * t(t - 1/2)(t - 1)`, whose
/// magnitude on [0, 1] peaks at `sqrt(3) / 36`.
pub const DEGREE_REDUCTION_ERROR: f64 = 0.048_112_522_432_468_82;

/// Relative threshold under which control points count as lying on the chord
const COLLINEAR_EPSILON: f64 = 1e-9;

/// Line segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSeg {
    pub from: Point,
    pub to: Point,
}

/// Quadratic Bézier segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBez {
    pub from: Point,
    pub ctrl: Point,
    pub to: Point,
}

/// Cubic Bézier segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBez {
    pub from: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub to: Point,
}

impl QuadBez {
    pub const fn new(from: Point, ctrl: Point, to: Point) -> Self {
        Self { from, ctrl, to }
    }

    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        self.from * (mt * mt) + self.ctrl * (2.0 * mt * t) + self.to * (t * t)
    }

    pub fn transform(&self, ts: &Transform) -> QuadBez {
        QuadBez::new(
            ts.transform_point(self.from),
            ts.transform_point(self.ctrl),
            ts.transform_point(self.to),
        )
    }

    /// Parameters in (0, 1) where dx/dt or dy/dt is zero
    pub fn extrema(&self) -> SmallVec<[f64; 2]> {
        let mut ts = SmallVec::new();
        for (p0, p1, p2) in [
            (self.from.x, self.ctrl.x, self.to.x),
            (self.from.y, self.ctrl.y, self.to.y),
        ] {
            let denom = p0 - 2.0 * p1 + p2;
            if denom != 0.0 {
                let t = (p0 - p1) / denom;
                if t > 0.0 && t < 1.0 {
                    ts.push(t);
                }
            }
        }
        ts
    }

    pub fn bounds(&self) -> Rect {
        let bbox: BBox = [self.from, self.to]
            .into_iter()
            .chain(self.extrema().into_iter().map(|t| self.eval(t)))
            .collect();
        bbox.rect().unwrap_or_default()
    }

    /// Exact cubic representation (degree elevation)
    pub fn elevate(&self) -> CubicBez {
        CubicBez::new(
            self.from,
            self.from.lerp(self.ctrl, 2.0 / 3.0),
            self.to.lerp(self.ctrl, 2.0 / 3.0),
            self.to,
        )
    }
}

impl CubicBez {
    pub const fn new(from: Point, ctrl1: Point, ctrl2: Point, to: Point) -> Self {
        Self {
            from,
            ctrl1,
            ctrl2,
            to,
        }
    }

    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        self.from * (mt * mt * mt)
            + self.ctrl1 * (3.0 * mt * mt * t)
            + self.ctrl2 * (3.0 * mt * t * t)
            + self.to * (t * t * t)
    }

    pub fn transform(&self, ts: &Transform) -> CubicBez {
        CubicBez::new(
            ts.transform_point(self.from),
            ts.transform_point(self.ctrl1),
            ts.transform_point(self.ctrl2),
            ts.transform_point(self.to),
        )
    }

    /// De Casteljau subdivision at `t`
    pub fn split(&self, t: f64) -> (CubicBez, CubicBez) {
        let p01 = self.from.lerp(self.ctrl1, t);
        let p12 = self.ctrl1.lerp(self.ctrl2, t);
        let p23 = self.ctrl2.lerp(self.to, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);
        (
            CubicBez::new(self.from, p01, p012, mid),
            CubicBez::new(mid, p123, p23, self.to),
        )
    }

    /// Coefficient `A = p3 - 3c2 + 3c1 - p0` of the `t^3` term
    fn cubic_coefficient(&self) -> Point {
        self.to - self.ctrl2 * 3.0 + self.ctrl1 * 3.0 - self.from
    }

    /// Single quadratic approximation by degree reduction
    ///
    /// Control point `(3(c1 + c2) - (p0 + p3)) / 4`; endpoints are kept.
    pub fn reduce(&self) -> QuadBez {
        let ctrl = ((self.ctrl1 + self.ctrl2) * 3.0 - (self.from + self.to)) * 0.25;
        QuadBez::new(self.from, ctrl, self.to)
    }

    /// Exact maximum distance between `eval(t)` and `reduce().eval(t)`
    pub fn reduction_error(&self) -> f64 {
        self.cubic_coefficient().length() * DEGREE_REDUCTION_ERROR
    }

    /// All four points coincide, or both controls sit on the chord between
    /// the endpoints so the curve never leaves it
    pub fn is_degenerate(&self) -> bool {
        let chord = self.to - self.from;
        let chord_len = chord.length();
        let scale = chord_len
            .max((self.ctrl1 - self.from).length())
            .max((self.ctrl2 - self.from).length());
        if scale == 0.0 {
            return true;
        }
        if chord_len <= COLLINEAR_EPSILON * scale {
            return false;
        }
        let on_chord = |p: Point| {
            let v = p - self.from;
            let dist = chord.cross(v).abs() / chord_len;
            let along = chord.dot(v) / (chord_len * chord_len);
            dist <= COLLINEAR_EPSILON * scale && (0.0..=1.0).contains(&along)
        };
        on_chord(self.ctrl1) && on_chord(self.ctrl2)
    }

    /// Parameters in (0, 1) where dx/dt or dy/dt is zero
    pub fn extrema(&self) -> SmallVec<[f64; 4]> {
        let mut ts = SmallVec::new();
        for (p0, p1, p2, p3) in [
            (self.from.x, self.ctrl1.x, self.ctrl2.x, self.to.x),
            (self.from.y, self.ctrl1.y, self.ctrl2.y, self.to.y),
        ] {
            // derivative / 3 = a t^2 + b t + c
            let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
            let b = 2.0 * (p0 - 2.0 * p1 + p2);
            let c = p1 - p0;
            for t in solve_quadratic(a, b, c) {
                if t > 0.0 && t < 1.0 {
                    ts.push(t);
                }
            }
        }
        ts
    }

    pub fn bounds(&self) -> Rect {
        let bbox: BBox = [self.from, self.to]
            .into_iter()
            .chain(self.extrema().into_iter().map(|t| self.eval(t)))
            .collect();
        bbox.rect().unwrap_or_default()
    }
}

/// Real roots of `a t^2 + b t + c = 0`, degrading to the linear case
fn solve_quadratic(a: f64, b: f64, c: f64) -> SmallVec<[f64; 2]> {
    let mut roots = SmallVec::new();
    let scale = a.abs().max(b.abs()).max(c.abs());
    if scale == 0.0 {
        return roots;
    }
    if a.abs() <= 1e-12 * scale {
        if b != 0.0 {
            roots.push(-c / b);
        }
        return roots;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return roots;
    }
    if disc == 0.0 {
        roots.push(-b / (2.0 * a));
        return roots;
    }
    // Numerically stable form, avoids cancellation when b^2 >> 4ac
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    roots.push(q / a);
    if q != 0.0 {
        roots.push(c / q);
    }
    roots
}
