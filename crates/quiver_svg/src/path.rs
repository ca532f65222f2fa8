//! Conversion between quiver paths and tiny-skia paths

use quiver_core::{Path, PathCommand, Point, Transform};

/// Convert a quiver path to a tiny-skia path
///
/// Returns `None` when the path draws nothing (only move-tos) or when a
/// coordinate does not fit in `f32`.
pub(crate) fn to_skia_path(path: &Path) -> Option<tiny_skia::Path> {
    let mut builder = tiny_skia::PathBuilder::new();

    for cmd in path.commands() {
        match *cmd {
            PathCommand::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathCommand::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathCommand::QuadTo { control, end } => builder.quad_to(
                control.x as f32,
                control.y as f32,
                end.x as f32,
                end.y as f32,
            ),
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => builder.cubic_to(
                control1.x as f32,
                control1.y as f32,
                control2.x as f32,
                control2.y as f32,
                end.x as f32,
                end.y as f32,
            ),
            PathCommand::Close => builder.close(),
        }
    }

    builder.finish()
}

/// Convert a tiny-skia path back to a quiver path
pub(crate) fn from_skia_path(path: &tiny_skia::Path) -> Path {
    let point = |p: tiny_skia::Point| Point::new(p.x as f64, p.y as f64);
    let mut result = Path::new();

    for segment in path.segments() {
        result = match segment {
            tiny_skia::PathSegment::MoveTo(p) => {
                let p = point(p);
                result.move_to(p.x, p.y)
            }
            tiny_skia::PathSegment::LineTo(p) => {
                let p = point(p);
                result.line_to(p.x, p.y)
            }
            tiny_skia::PathSegment::QuadTo(c, e) => {
                let (c, e) = (point(c), point(e));
                result.quad_to(c.x, c.y, e.x, e.y)
            }
            tiny_skia::PathSegment::CubicTo(c1, c2, e) => {
                let (c1, c2, e) = (point(c1), point(c2), point(e));
                result.cubic_to(c1.x, c1.y, c2.x, c2.y, e.x, e.y)
            }
            tiny_skia::PathSegment::Close => result.close(),
        };
    }

    result
}

pub(crate) fn to_skia_transform(ts: &Transform) -> tiny_skia::Transform {
    let [a, b, c, d, tx, ty] = ts.elements.map(|v| v as f32);
    tiny_skia::Transform::from_row(a, b, c, d, tx, ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_skia() {
        let path = Path::new()
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .quad_to(15.0, 5.0, 10.0, 10.0)
            .cubic_to(8.0, 12.0, 2.0, 12.0, 0.0, 10.0)
            .close();
        let skia = to_skia_path(&path).unwrap();
        assert_eq!(from_skia_path(&skia), path);
    }

    #[test]
    fn test_move_only_path_has_no_skia_equivalent() {
        assert!(to_skia_path(&Path::new().move_to(1.0, 1.0)).is_none());
        assert!(to_skia_path(&Path::new()).is_none());
    }

    #[test]
    fn test_transform_element_order() {
        let ts = to_skia_transform(&Transform::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
        assert_eq!((ts.sx, ts.ky, ts.kx, ts.sy, ts.tx, ts.ty), (1.0, 2.0, 3.0, 4.0, 5.0, 6.0));
    }
}
