//! Cubic → quadratic curve simplification
//!
//! Each cubic is first approximated by a single quadratic through degree
//! reduction. The approximation error of that fit is known in closed form
//! (see [`CubicBez::reduction_error`]), so no sampling is needed: when it
//! exceeds the tolerance the cubic is split at `t = 0.5` and both halves are
//! processed in order. Halving shrinks the error by a factor of 8, so the
//! fixed depth limit is only reached on pathological input (huge coordinates
//! against a tiny tolerance, non-finite values). In that case the best
//! quadratic is emitted anyway and the residual is reported.

use smallvec::SmallVec;

use crate::bezier::{CubicBez, QuadBez};
use crate::error::GeometryError;
use crate::path::{Path, PathCommand, Segment};

/// Default subdivision depth limit; up to 2^16 quadratics per cubic
pub const DEFAULT_MAX_DEPTH: u32 = 16;

/// Options for cubic → quadratic conversion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimplifyOptions {
    /// Maximum allowed distance between the cubic and its replacement
    pub tolerance: f64,
    /// Maximum number of halvings per cubic
    pub max_depth: u32,
}

impl SimplifyOptions {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(GeometryError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }
}

/// Summary of a simplification pass
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimplifyReport {
    /// Cubic segments replaced
    pub cubics_converted: usize,
    /// Quadratic segments emitted in their place
    pub quads_emitted: usize,
    /// Degenerate cubics replaced by a single line
    pub lines_emitted: usize,
    /// Quadratics emitted at the depth limit with error above tolerance
    pub depth_limited: usize,
    /// Largest approximation error of any emitted quadratic
    pub max_error: f64,
}

impl SimplifyReport {
    /// Combine the reports of two passes
    pub fn merge(&mut self, other: &SimplifyReport) {
        self.cubics_converted += other.cubics_converted;
        self.quads_emitted += other.quads_emitted;
        self.lines_emitted += other.lines_emitted;
        self.depth_limited += other.depth_limited;
        self.max_error = self.max_error.max(other.max_error);
    }

    /// True when every emitted segment honours the requested tolerance
    pub fn within_tolerance(&self) -> bool {
        self.depth_limited == 0
    }
}

/// Replacement for a single cubic
#[derive(Clone, Debug, PartialEq)]
pub enum Approximation {
    /// The cubic never leaves its chord
    Line,
    /// Ordered quadratics from the cubic's start to its end
    Quads(Vec<QuadBez>),
}

/// Approximate `cubic` by quadratics within `options.tolerance`
///
/// Quadratics are returned in curve order; the first starts at
/// `cubic.from` and the last ends at `cubic.to` exactly.
pub fn cubic_to_quads(
    cubic: &CubicBez,
    options: &SimplifyOptions,
    report: &mut SimplifyReport,
) -> Result<Approximation, GeometryError> {
    options.validate()?;
    report.cubics_converted += 1;

    if cubic.is_degenerate() {
        report.lines_emitted += 1;
        return Ok(Approximation::Line);
    }

    let mut quads = Vec::new();
    let mut limited = 0usize;
    // Right halves are pushed first so pieces pop in curve order
    let mut stack: SmallVec<[(CubicBez, u32); 16]> = SmallVec::new();
    stack.push((*cubic, 0));

    while let Some((piece, depth)) = stack.pop() {
        let error = piece.reduction_error();
        let fits = error <= options.tolerance;
        if fits || depth >= options.max_depth {
            if !fits {
                limited += 1;
            }
            if error.is_finite() {
                report.max_error = report.max_error.max(error);
            } else {
                report.max_error = f64::INFINITY;
            }
            quads.push(piece.reduce());
            continue;
        }
        let (left, right) = piece.split(0.5);
        stack.push((right, depth + 1));
        stack.push((left, depth + 1));
    }

    // Subdivision computes split points; pin the outer endpoints exactly
    if let Some(first) = quads.first_mut() {
        first.from = cubic.from;
    }
    if let Some(last) = quads.last_mut() {
        last.to = cubic.to;
    }

    if limited > 0 {
        tracing::warn!(
            "cubic {:?} hit subdivision depth {}; {} quadratics exceed tolerance {}",
            cubic,
            options.max_depth,
            limited,
            options.tolerance
        );
    }
    report.depth_limited += limited;
    report.quads_emitted += quads.len();
    Ok(Approximation::Quads(quads))
}

impl Path {
    /// Replace every `CubicTo` with quadratics (or a line for degenerate
    /// cubics), preserving command order and subpath structure
    ///
    /// The tolerance is checked before anything is modified.
    pub fn simplify_cubics(
        &mut self,
        options: &SimplifyOptions,
    ) -> Result<SimplifyReport, GeometryError> {
        options.validate()?;
        let mut report = SimplifyReport::default();
        if !self.has_cubics() {
            return Ok(report);
        }

        let mut rewritten = Vec::with_capacity(self.commands().len());
        let mut segments = self.segments();

        for cmd in self.commands() {
            match *cmd {
                PathCommand::CubicTo { end, .. } => {
                    let cubic = next_cubic(&mut segments)?;
                    match cubic_to_quads(&cubic, options, &mut report)? {
                        Approximation::Line => rewritten.push(PathCommand::LineTo(end)),
                        Approximation::Quads(quads) => {
                            rewritten.extend(quads.into_iter().map(|q| PathCommand::QuadTo {
                                control: q.ctrl,
                                end: q.to,
                            }));
                        }
                    }
                }
                other => rewritten.push(other),
            }
        }

        *self.commands_mut() = rewritten;
        Ok(report)
    }
}

/// Advance `segments` to the next cubic, skipping other segment kinds
fn next_cubic(segments: &mut crate::path::Segments<'_>) -> Result<CubicBez, GeometryError> {
    for seg in segments.by_ref() {
        if let Segment::Cubic(cubic) = seg {
            return Ok(cubic);
        }
    }
    Err(GeometryError::InvalidPath(
        "cubic command without a matching segment".to_string(),
    ))
}

/// Largest sampled distance between `cubic` and the quadratics replacing it
///
/// Quadratics are matched to equal-length parameter ranges of the cubic in
/// order. This mirrors [`cubic_to_quads`]: the `t^3` coefficient of a piece
/// covering a parameter range of length `h` is `A * h^3` wherever the range
/// sits, so every piece of one cubic ends at the same depth.
pub fn max_parametric_deviation(cubic: &CubicBez, quads: &[QuadBez], samples: usize) -> f64 {
    let n = quads.len().max(1) as f64;
    let mut max = 0.0f64;
    for (i, quad) in quads.iter().enumerate() {
        for s in 0..=samples {
            let u = s as f64 / samples as f64;
            let t = (i as f64 + u) / n;
            max = max.max(cubic.eval(t).distance(quad.eval(u)));
        }
    }
    max
}
