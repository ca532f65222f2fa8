//! SVG serialization
//!
//! Every shape becomes a `<path>` carrying its fully resolved style, so the
//! output never relies on inheritance. Numbers use Rust's shortest
//! round-trip float formatting.

use std::fmt::{self, Write};

use quiver_core::{PathCommand, Size, Transform};

use crate::document::{Document, NodeId, NodeKind, Shape};
use crate::style::{FillRule, LineCap, LineJoin};

const SVG_NS: &str = "http://www.w3.org/2000/svg";

pub(crate) fn write_document<W: Write>(doc: &Document, out: &mut W) -> fmt::Result {
    write!(out, "<svg xmlns=\"{SVG_NS}\"")?;

    let root_ts = doc.root_transform;
    let wrapper = match doc.canvas {
        Some(Size { width, height }) => {
            write!(out, " width=\"{width}\" height=\"{height}\"")?;
            let [sx, _, _, sy, tx, ty] = root_ts.elements;
            if root_ts.is_axis_aligned() && sx > 0.0 && sy > 0.0 {
                write!(
                    out,
                    " viewBox=\"{} {} {} {}\" preserveAspectRatio=\"none\"",
                    0.0 - tx / sx,
                    0.0 - ty / sy,
                    width / sx,
                    height / sy
                )?;
                None
            } else {
                write!(out, " viewBox=\"0 0 {width} {height}\"")?;
                Some(root_ts)
            }
        }
        None => (!root_ts.is_identity()).then_some(root_ts),
    };
    out.write_str(">\n")?;

    let mut depth = 1;
    if let Some(ts) = wrapper {
        indent(out, depth)?;
        out.write_str("<g")?;
        write_transform(out, &ts)?;
        out.write_str(">\n")?;
        depth += 1;
    }
    write_node(doc, doc.root, depth, out)?;
    if wrapper.is_some() {
        indent(out, 1)?;
        out.write_str("</g>\n")?;
    }
    out.write_str("</svg>\n")
}

fn write_node<W: Write>(doc: &Document, id: NodeId, depth: usize, out: &mut W) -> fmt::Result {
    let node = &doc.nodes[id];
    let is_root = id == doc.root;
    let plain_root = is_root
        && node.id.is_none()
        && node.opacity >= 1.0
        && node.transform.is_identity();

    match &node.kind {
        NodeKind::Group if plain_root => {
            for &child in &node.children {
                write_node(doc, child, depth, out)?;
            }
        }
        NodeKind::Group => {
            indent(out, depth)?;
            out.write_str("<g")?;
            write_node_attrs(out, node.id.as_deref(), &node.transform, node.opacity)?;
            if node.children.is_empty() {
                return out.write_str("/>\n");
            }
            out.write_str(">\n")?;
            for &child in &node.children {
                write_node(doc, child, depth + 1, out)?;
            }
            indent(out, depth)?;
            out.write_str("</g>\n")?;
        }
        NodeKind::Shape(shape) => {
            indent(out, depth)?;
            out.write_str("<path")?;
            write_node_attrs(out, node.id.as_deref(), &node.transform, node.opacity)?;
            write_shape(out, shape)?;
            out.write_str("/>\n")?;
        }
    }
    Ok(())
}

fn write_node_attrs<W: Write>(
    out: &mut W,
    id: Option<&str>,
    transform: &Transform,
    opacity: f64,
) -> fmt::Result {
    if let Some(id) = id {
        write!(out, " id=\"{}\"", escape(id))?;
    }
    if !transform.is_identity() {
        write_transform(out, transform)?;
    }
    if opacity < 1.0 {
        write!(out, " opacity=\"{opacity}\"")?;
    }
    Ok(())
}

fn write_transform<W: Write>(out: &mut W, ts: &Transform) -> fmt::Result {
    let [a, b, c, d, e, f] = ts.elements;
    write!(out, " transform=\"matrix({a} {b} {c} {d} {e} {f})\"")
}

fn write_shape<W: Write>(out: &mut W, shape: &Shape) -> fmt::Result {
    out.write_str(" d=\"")?;
    write_path_data(out, shape.path.commands())?;
    out.write_char('"')?;

    let style = &shape.style;
    match &style.fill {
        Some(fill) => {
            write!(out, " fill=\"{}\"", fill.color)?;
            if fill.opacity < 1.0 {
                write!(out, " fill-opacity=\"{}\"", fill.opacity)?;
            }
            if fill.rule == FillRule::EvenOdd {
                out.write_str(" fill-rule=\"evenodd\"")?;
            }
        }
        None => out.write_str(" fill=\"none\"")?,
    }

    if let Some(stroke) = &style.stroke {
        write!(
            out,
            " stroke=\"{}\" stroke-width=\"{}\"",
            stroke.color, stroke.width
        )?;
        if stroke.opacity < 1.0 {
            write!(out, " stroke-opacity=\"{}\"", stroke.opacity)?;
        }
        match stroke.cap {
            LineCap::Butt => {}
            LineCap::Round => out.write_str(" stroke-linecap=\"round\"")?,
            LineCap::Square => out.write_str(" stroke-linecap=\"square\"")?,
        }
        match stroke.join {
            LineJoin::Miter => {}
            LineJoin::Round => out.write_str(" stroke-linejoin=\"round\"")?,
            LineJoin::Bevel => out.write_str(" stroke-linejoin=\"bevel\"")?,
        }
        if stroke.miter_limit != 4.0 {
            write!(out, " stroke-miterlimit=\"{}\"", stroke.miter_limit)?;
        }
        if let Some(dash) = &stroke.dash {
            out.write_str(" stroke-dasharray=\"")?;
            for (i, v) in dash.array().iter().enumerate() {
                if i > 0 {
                    out.write_char(' ')?;
                }
                write!(out, "{v}")?;
            }
            out.write_char('"')?;
            if dash.offset != 0.0 {
                write!(out, " stroke-dashoffset=\"{}\"", dash.offset)?;
            }
        }
    }
    Ok(())
}

fn write_path_data<W: Write>(out: &mut W, commands: &[PathCommand]) -> fmt::Result {
    for (i, cmd) in commands.iter().enumerate() {
        if i > 0 {
            out.write_char(' ')?;
        }
        match cmd {
            PathCommand::MoveTo(p) => write!(out, "M {} {}", p.x, p.y)?,
            PathCommand::LineTo(p) => write!(out, "L {} {}", p.x, p.y)?,
            PathCommand::QuadTo { control, end } => {
                write!(out, "Q {} {} {} {}", control.x, control.y, end.x, end.y)?
            }
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => write!(
                out,
                "C {} {} {} {} {} {}",
                control1.x, control1.y, control2.x, control2.y, end.x, end.y
            )?,
            PathCommand::Close => out.write_char('Z')?,
        }
    }
    Ok(())
}

fn indent<W: Write>(out: &mut W, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        out.write_str("  ")?;
    }
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Color, Dash, Fill, StrokeStyle, Style};
    use quiver_core::{Path, Rect};

    #[test]
    fn test_empty_document() {
        let doc = Document::new(10.0, 20.0).unwrap();
        assert_eq!(
            doc.serialize(),
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"20\" \
             viewBox=\"0 0 10 20\" preserveAspectRatio=\"none\">\n</svg>\n"
        );
    }

    #[test]
    fn test_shape_attributes() {
        let mut doc = Document::new(10.0, 10.0).unwrap();
        let mut fill = Fill::new(Color::rgb(255, 0, 0));
        fill.opacity = 0.5;
        fill.rule = FillRule::EvenOdd;
        let mut stroke = StrokeStyle::new(Color::BLACK, 1.5);
        stroke.join = LineJoin::Round;
        stroke.dash = Dash::new(vec![2.0, 1.0], 0.5);
        let id = doc
            .add_shape(
                doc.root(),
                Path::new().move_to(0.0, 0.0).quad_to(1.0, 2.0, 3.0, 4.0).close(),
                Style::none().with_fill(fill).with_stroke(stroke),
            )
            .unwrap();
        doc.set_element_id(id, "a&b").unwrap();

        let text = doc.serialize();
        assert!(text.contains(
            "<path id=\"a&amp;b\" d=\"M 0 0 Q 1 2 3 4 Z\" fill=\"#ff0000\" \
             fill-opacity=\"0.5\" fill-rule=\"evenodd\" stroke=\"#000000\" \
             stroke-width=\"1.5\" stroke-linejoin=\"round\" \
             stroke-dasharray=\"2 1\" stroke-dashoffset=\"0.5\"/>"
        ), "{text}");
    }

    #[test]
    fn test_unfilled_shape_writes_fill_none() {
        let mut doc = Document::new(10.0, 10.0).unwrap();
        doc.add_shape(doc.root(), Path::rect(Rect::new(0.0, 0.0, 1.0, 1.0)), Style::none())
            .unwrap();
        assert!(doc.serialize().contains("fill=\"none\""));
    }

    #[test]
    fn test_cropped_root_uses_view_box() {
        let mut doc = Document::new(100.0, 100.0).unwrap();
        doc.crop(Rect::new(10.5, 20.0, 30.0, 40.0)).unwrap();
        assert!(doc
            .serialize()
            .contains("width=\"30\" height=\"40\" viewBox=\"10.5 20 30 40\""));
    }

    #[test]
    fn test_rotated_root_uses_wrapper_group() {
        let mut doc = Document::new(10.0, 10.0).unwrap();
        doc.root_transform = Transform::new(0.0, 1.0, -1.0, 0.0, 10.0, 0.0);
        let text = doc.serialize();
        assert!(text.contains("viewBox=\"0 0 10 10\">"));
        assert!(text.contains("<g transform=\"matrix(0 1 -1 0 10 0)\">"));
    }

    #[test]
    fn test_groups_nest() {
        let mut doc = Document::new(10.0, 10.0).unwrap();
        let g = doc
            .add_group(doc.root(), Transform::translation(1.0, 2.0))
            .unwrap();
        doc.set_opacity(g, 0.25).unwrap();
        doc.add_shape(g, Path::rect(Rect::new(0.0, 0.0, 1.0, 1.0)), Style::default())
            .unwrap();
        let text = doc.serialize();
        assert!(text.contains(
            "  <g transform=\"matrix(1 0 0 1 1 2)\" opacity=\"0.25\">\n    <path"
        ));
        assert!(text.contains("  </g>\n"));
    }
}
