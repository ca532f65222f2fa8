//! Path model
//!
//! A [`Path`] is an ordered list of [`PathCommand`]s. Drawing commands carry
//! only their end (and control) points; the start point is implied by the
//! previous command, which is what [`Path::segments`] resolves.

use crate::bezier::{CubicBez, LineSeg, QuadBez};
use crate::error::GeometryError;
use crate::geometry::{BBox, Point, Rect};
use crate::transform::Transform;

/// Magic number for cubic Bézier circle approximation
const KAPPA: f64 = 0.552_284_749_831;

/// Path command for building vector paths
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    /// Move to a point, starting a new subpath
    MoveTo(Point),
    /// Line to a point
    LineTo(Point),
    /// Quadratic Bézier curve
    QuadTo { control: Point, end: Point },
    /// Cubic Bézier curve
    CubicTo {
        control1: Point,
        control2: Point,
        end: Point,
    },
    /// Close the current subpath
    Close,
}

impl PathCommand {
    /// Apply `ts` to every point of the command
    pub fn transform(&self, ts: &Transform) -> PathCommand {
        let map = |p: Point| ts.transform_point(p);
        match *self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(map(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(map(p)),
            PathCommand::QuadTo { control, end } => PathCommand::QuadTo {
                control: map(control),
                end: map(end),
            },
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => PathCommand::CubicTo {
                control1: map(control1),
                control2: map(control2),
                end: map(end),
            },
            PathCommand::Close => PathCommand::Close,
        }
    }

    pub fn is_cubic(&self) -> bool {
        matches!(self, PathCommand::CubicTo { .. })
    }
}

/// A resolved drawing segment with its explicit start point
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Segment {
    Line(LineSeg),
    Quad(QuadBez),
    Cubic(CubicBez),
}

impl Segment {
    /// Tight axis-aligned extent of the segment
    pub fn bounds(&self) -> Rect {
        match self {
            Segment::Line(line) => Rect::from_points(line.from, line.to),
            Segment::Quad(quad) => quad.bounds(),
            Segment::Cubic(cubic) => cubic.bounds(),
        }
    }
}

/// A vector path
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Create a path from a vector of commands, checking subpath structure
    pub fn from_commands(commands: Vec<PathCommand>) -> Result<Self, GeometryError> {
        let path = Self { commands };
        path.validate()?;
        Ok(path)
    }

    /// Move to a point
    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::MoveTo(Point::new(x, y)));
        self
    }

    /// Line to a point
    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::LineTo(Point::new(x, y)));
        self
    }

    /// Quadratic Bézier curve
    pub fn quad_to(mut self, cx: f64, cy: f64, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::QuadTo {
            control: Point::new(cx, cy),
            end: Point::new(x, y),
        });
        self
    }

    /// Cubic Bézier curve
    pub fn cubic_to(mut self, cx1: f64, cy1: f64, cx2: f64, cy2: f64, x: f64, y: f64) -> Self {
        self.commands.push(PathCommand::CubicTo {
            control1: Point::new(cx1, cy1),
            control2: Point::new(cx2, cy2),
            end: Point::new(x, y),
        });
        self
    }

    /// Close the path
    pub fn close(mut self) -> Self {
        self.commands.push(PathCommand::Close);
        self
    }

    /// Create a rectangle path
    pub fn rect(rect: Rect) -> Self {
        Self::new()
            .move_to(rect.x(), rect.y())
            .line_to(rect.right(), rect.y())
            .line_to(rect.right(), rect.bottom())
            .line_to(rect.x(), rect.bottom())
            .close()
    }

    /// Create an axis-aligned ellipse path from four cubic arcs
    pub fn ellipse(center: Point, rx: f64, ry: f64) -> Self {
        let (cx, cy) = (center.x, center.y);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);

        Self::new()
            .move_to(cx + rx, cy)
            .cubic_to(cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry)
            .cubic_to(cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy)
            .cubic_to(cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry)
            .cubic_to(cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy)
            .close()
    }

    /// Create a circle path
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::ellipse(center, radius, radius)
    }

    /// Create a rectangle with elliptical corners
    ///
    /// Radii are clamped to half of the corresponding side.
    pub fn rounded_rect(rect: Rect, rx: f64, ry: f64) -> Self {
        let rx = rx.clamp(0.0, rect.width() / 2.0);
        let ry = ry.clamp(0.0, rect.height() / 2.0);
        if rx == 0.0 || ry == 0.0 {
            return Self::rect(rect);
        }

        let (x, y, r, b) = (rect.x(), rect.y(), rect.right(), rect.bottom());
        let (kx, ky) = (rx * (1.0 - KAPPA), ry * (1.0 - KAPPA));

        Self::new()
            .move_to(x + rx, y)
            .line_to(r - rx, y)
            .cubic_to(r - kx, y, r, y + ky, r, y + ry)
            .line_to(r, b - ry)
            .cubic_to(r, b - ky, r - kx, b, r - rx, b)
            .line_to(x + rx, b)
            .cubic_to(x + kx, b, x, b - ky, x, b - ry)
            .line_to(x, y + ry)
            .cubic_to(x, y + ky, x + kx, y, x + rx, y)
            .close()
    }

    /// Create an open polyline, or a polygon when `closed`
    pub fn polyline(points: &[Point], closed: bool) -> Self {
        let mut path = Self::new();
        for (i, p) in points.iter().enumerate() {
            path = if i == 0 {
                path.move_to(p.x, p.y)
            } else {
                path.line_to(p.x, p.y)
            };
        }
        if closed && !points.is_empty() {
            path = path.close();
        }
        path
    }

    /// Create a line path
    pub fn line(from: Point, to: Point) -> Self {
        Self::new().move_to(from.x, from.y).line_to(to.x, to.y)
    }

    /// Get the path commands
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn has_cubics(&self) -> bool {
        self.commands.iter().any(PathCommand::is_cubic)
    }

    /// Check that the path starts with `MoveTo`
    ///
    /// This also guarantees every `Close` follows at least one `MoveTo`.
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self.commands.first() {
            None | Some(PathCommand::MoveTo(_)) => {}
            Some(other) => {
                return Err(GeometryError::InvalidPath(format!(
                    "path must start with MoveTo, found {other:?}"
                )))
            }
        }
        if let Some(bad) = self.points().find(|p| !p.is_finite()) {
            return Err(GeometryError::InvalidPath(format!(
                "non-finite coordinate {bad:?}"
            )));
        }
        Ok(())
    }

    /// Every point stored in the path, controls included
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.commands.iter().flat_map(|cmd| {
            let pts: [Option<Point>; 3] = match *cmd {
                PathCommand::MoveTo(p) | PathCommand::LineTo(p) => [Some(p), None, None],
                PathCommand::QuadTo { control, end } => [Some(control), Some(end), None],
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => [Some(control1), Some(control2), Some(end)],
                PathCommand::Close => [None, None, None],
            };
            pts.into_iter().flatten()
        })
    }

    /// Resolve commands into segments with explicit start points
    ///
    /// `Close` yields the closing line when the subpath does not already end
    /// at its start point.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            commands: self.commands.iter(),
            current: Point::ZERO,
            start: Point::ZERO,
        }
    }

    /// A copy of this path with `ts` applied to every point
    pub fn transformed(&self, ts: &Transform) -> Path {
        Path {
            commands: self.commands.iter().map(|cmd| cmd.transform(ts)).collect(),
        }
    }

    /// Tight bounds of the path geometry
    ///
    /// Includes isolated `MoveTo` points so a lone point still has a location.
    pub fn bounds(&self) -> BBox {
        let mut bbox = BBox::Empty;
        for cmd in &self.commands {
            if let PathCommand::MoveTo(p) = cmd {
                bbox = bbox.include_point(*p);
            }
        }
        self.segments()
            .fold(bbox, |bbox, seg| bbox.union(seg.bounds().into()))
    }

    /// Mutable access for in-place rewrites within this crate
    pub(crate) fn commands_mut(&mut self) -> &mut Vec<PathCommand> {
        &mut self.commands
    }
}

/// Iterator over the drawing segments of a [`Path`]
pub struct Segments<'a> {
    commands: std::slice::Iter<'a, PathCommand>,
    current: Point,
    start: Point,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        loop {
            let from = self.current;
            let seg = match *self.commands.next()? {
                PathCommand::MoveTo(p) => {
                    self.current = p;
                    self.start = p;
                    continue;
                }
                PathCommand::LineTo(to) => Segment::Line(LineSeg { from, to }),
                PathCommand::QuadTo { control, end } => {
                    Segment::Quad(QuadBez::new(from, control, end))
                }
                PathCommand::CubicTo {
                    control1,
                    control2,
                    end,
                } => Segment::Cubic(CubicBez::new(from, control1, control2, end)),
                PathCommand::Close => {
                    self.current = self.start;
                    if from == self.start {
                        continue;
                    }
                    Segment::Line(LineSeg {
                        from,
                        to: self.start,
                    })
                }
            };
            self.current = match seg {
                Segment::Line(l) => l.to,
                Segment::Quad(q) => q.to,
                Segment::Cubic(c) => c.to,
            };
            return Some(seg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_commands_rejects_leading_close() {
        let err = Path::from_commands(vec![PathCommand::Close]).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidPath(_)));
    }

    #[test]
    fn test_from_commands_rejects_leading_line() {
        let cmds = vec![PathCommand::LineTo(Point::new(1.0, 1.0))];
        assert!(Path::from_commands(cmds).is_err());
    }

    #[test]
    fn test_from_commands_rejects_nan() {
        let cmds = vec![PathCommand::MoveTo(Point::new(f64::NAN, 0.0))];
        assert!(Path::from_commands(cmds).is_err());
    }

    #[test]
    fn test_segments_resolve_start_points() {
        let path = Path::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .quad_to(15.0, 5.0, 10.0, 10.0)
            .close();
        let segs: Vec<Segment> = path.segments().collect();

        assert_eq!(segs.len(), 3);
        assert_eq!(
            segs[1],
            Segment::Quad(QuadBez::new(
                Point::new(10.0, 0.0),
                Point::new(15.0, 5.0),
                Point::new(10.0, 10.0)
            ))
        );
        // Close emits the implicit line back to the start
        assert_eq!(
            segs[2],
            Segment::Line(LineSeg {
                from: Point::new(10.0, 10.0),
                to: Point::ZERO
            })
        );
    }

    #[test]
    fn test_drawing_after_close_continues_from_subpath_start() {
        let path = Path::new()
            .move_to(5.0, 5.0)
            .line_to(10.0, 5.0)
            .close()
            .line_to(5.0, 20.0);
        let last = path.segments().last().unwrap();
        assert_eq!(
            last,
            Segment::Line(LineSeg {
                from: Point::new(5.0, 5.0),
                to: Point::new(5.0, 20.0)
            })
        );
    }

    #[test]
    fn test_circle_bounds_are_tight() {
        let path = Path::circle(Point::new(50.0, 50.0), 10.0);
        let rect = path.bounds().rect().unwrap();
        assert!((rect.x() - 40.0).abs() < 1e-9);
        assert!((rect.y() - 40.0).abs() < 1e-9);
        assert!((rect.width() - 20.0).abs() < 1e-9);
        assert!((rect.height() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_path_has_empty_bounds() {
        assert!(Path::new().bounds().is_empty());
    }

    #[test]
    fn test_transformed_rotated_bounds() {
        let path = Path::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        let rotated = path.transformed(&Transform::rotation(std::f64::consts::FRAC_PI_4));
        let rect = rotated.bounds().rect().unwrap();
        let diag = 10.0 * std::f64::consts::SQRT_2;
        assert!((rect.width() - diag).abs() < 1e-9);
        assert!((rect.height() - diag).abs() < 1e-9);
    }

    #[test]
    fn test_rounded_rect_clamps_radii() {
        let path = Path::rounded_rect(Rect::new(0.0, 0.0, 10.0, 4.0), 50.0, 50.0);
        let rect = path.bounds().rect().unwrap();
        assert!((rect.width() - 10.0).abs() < 1e-9);
        assert!((rect.height() - 4.0).abs() < 1e-9);
    }
}
