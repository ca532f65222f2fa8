//! SVG source → [`Document`]
//!
//! XML is read with roxmltree and attribute micro-syntax (lengths, paints,
//! transforms, path data) with svgtypes. Paint properties cascade from
//! ancestors; every shape ends up with a fully resolved [`Style`].

use std::str::FromStr;

use quiver_core::{Path, Point, Rect, Size, Transform};
use svgtypes::{Align, AspectRatio, Length, LengthUnit, PaintFallback};
use tracing::{debug, warn};

use crate::config::DocumentConfig;
use crate::document::{Document, Node, NodeId, NodeKind, Shape};
use crate::error::{Result, SvgError};
use crate::style::{Color, Dash, Fill, FillRule, LineCap, LineJoin, StrokeStyle, Style};

type PropResult<T> = std::result::Result<T, String>;

/// CSS pixels per inch
const DPI: f64 = 96.0;
/// Font size assumed for `em`/`ex` units
const FONT_SIZE: f64 = 16.0;

pub(crate) fn parse_document(text: &str, config: DocumentConfig) -> Result<Document> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| SvgError::parse_at(e.pos(), e.to_string()))?;

    let root = xml.root_element();
    let pos = xml.text_pos_at(root.range().start);
    if root.tag_name().name() != "svg" {
        return Err(SvgError::parse_at(
            pos,
            format!("root element must be <svg>, found <{}>", root.tag_name().name()),
        ));
    }

    let (canvas, root_transform, viewport) =
        parse_viewport(root).map_err(|msg| SvgError::parse_at(pos, msg))?;
    debug!("parsed canvas {:?} with root transform {:?}", canvas, root_transform);

    let mut parser = Parser {
        xml: &xml,
        doc: Document::empty(canvas, root_transform, config),
        viewport,
    };
    let root_id = parser.doc.root();
    let Some(props) = parser.element_props(root, &Cascade::default())? else {
        return Ok(parser.doc);
    };
    if !props.transform.is_invertible() {
        debug!("root <svg> has a degenerate transform, nothing is drawn");
        return Ok(parser.doc);
    }
    if let Some(element_id) = root.attribute("id") {
        parser.doc.set_element_id(root_id, element_id)?;
    }
    parser.doc.set_opacity(root_id, props.opacity)?;
    // Applies inside the viewBox mapping, like any group transform
    parser.doc.nodes[root_id].transform = props.transform;
    parser.convert_children(root, root_id, &props.cascade)?;
    Ok(parser.doc)
}

// ─────────────────────────────────────────────────────────────────────────────
// Viewport
// ─────────────────────────────────────────────────────────────────────────────

/// Canvas extents, root transform and the size percentages resolve against
fn parse_viewport(root: roxmltree::Node<'_, '_>) -> PropResult<(Option<Size>, Transform, Size)> {
    let view_box = root
        .attribute("viewBox")
        .map(|v| {
            svgtypes::ViewBox::from_str(v).map_err(|e| format!("invalid viewBox {v:?}: {e}"))
        })
        .transpose()?;
    if let Some(vb) = view_box {
        if vb.w <= 0.0 || vb.h <= 0.0 {
            return Err(format!("viewBox must have a positive size, got {}x{}", vb.w, vb.h));
        }
    }

    let width = root_extent(root.attribute("width"), view_box.map(|vb| vb.w))?;
    let height = root_extent(root.attribute("height"), view_box.map(|vb| vb.h))?;
    let canvas = width.zip(height).map(|(w, h)| Size::new(w, h));

    let aspect = match root.attribute("preserveAspectRatio") {
        Some(v) => AspectRatio::from_str(v)
            .map_err(|e| format!("invalid preserveAspectRatio {v:?}: {e}"))?,
        None => AspectRatio {
            defer: false,
            align: Align::XMidYMid,
            slice: false,
        },
    };

    let root_transform = match (view_box, canvas) {
        (Some(vb), Some(size)) => view_box_transform(&vb, aspect, size),
        _ => Transform::IDENTITY,
    };
    let viewport = view_box
        .map(|vb| Size::new(vb.w, vb.h))
        .or(canvas)
        .unwrap_or(Size::ZERO);
    Ok((canvas, root_transform, viewport))
}

/// Outer `width`/`height`: missing or `auto` falls back to the viewBox,
/// percentages resolve against it, zero leaves the canvas unset
fn root_extent(value: Option<&str>, fallback: Option<f64>) -> PropResult<Option<f64>> {
    let value = match value.map(str::trim) {
        None | Some("auto") => return Ok(fallback),
        Some(value) => value,
    };
    let length = parse_length(value)?;
    let extent = match (length.unit, fallback) {
        (LengthUnit::Percent, Some(reference)) => length.number * reference / 100.0,
        (LengthUnit::Percent, None) => return Ok(None),
        _ => to_user_units(length, 0.0),
    };
    if extent < 0.0 {
        return Err(format!("canvas size must not be negative, got {value:?}"));
    }
    Ok((extent > 0.0).then_some(extent))
}

fn view_box_transform(vb: &svgtypes::ViewBox, aspect: AspectRatio, size: Size) -> Transform {
    let (sx, sy) = (size.width / vb.w, size.height / vb.h);
    let (sx, sy) = if aspect.align == Align::None {
        (sx, sy)
    } else {
        let s = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
        (s, s)
    };

    let (x, y) = (-vb.x * sx, -vb.y * sy);
    // Free space left over by uniform scaling, distributed by alignment
    let (w, h) = (size.width - vb.w * sx, size.height - vb.h * sy);
    let (tx, ty) = match aspect.align {
        Align::None | Align::XMinYMin => (x, y),
        Align::XMidYMin => (x + w / 2.0, y),
        Align::XMaxYMin => (x + w, y),
        Align::XMinYMid => (x, y + h / 2.0),
        Align::XMidYMid => (x + w / 2.0, y + h / 2.0),
        Align::XMaxYMid => (x + w, y + h / 2.0),
        Align::XMinYMax => (x, y + h),
        Align::XMidYMax => (x + w / 2.0, y + h),
        Align::XMaxYMax => (x + w, y + h),
    };
    Transform::new(sx, 0.0, 0.0, sy, tx, ty)
}

// ─────────────────────────────────────────────────────────────────────────────
// Property cascade
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum PaintSpec {
    None,
    /// Color and its own alpha
    Color(Color, f64),
    CurrentColor,
}

/// Inherited presentation properties
#[derive(Clone, Debug)]
struct Cascade {
    fill: PaintSpec,
    fill_opacity: f64,
    fill_rule: FillRule,
    stroke: PaintSpec,
    stroke_opacity: f64,
    stroke_width: f64,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f64,
    dash_array: Option<Vec<f64>>,
    dash_offset: f64,
    color: (Color, f64),
    visible: bool,
}

impl Default for Cascade {
    fn default() -> Self {
        Self {
            fill: PaintSpec::Color(Color::BLACK, 1.0),
            fill_opacity: 1.0,
            fill_rule: FillRule::NonZero,
            stroke: PaintSpec::None,
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
            dash_array: None,
            dash_offset: 0.0,
            color: (Color::BLACK, 1.0),
            visible: true,
        }
    }
}

impl Cascade {
    /// Apply one declaration; unknown properties are ignored
    fn apply(&mut self, name: &str, value: &str, viewport: Size) -> PropResult<()> {
        if value == "inherit" {
            return Ok(());
        }
        match name {
            "fill" => self.fill = parse_paint(value)?,
            "stroke" => self.stroke = parse_paint(value)?,
            "fill-opacity" => self.fill_opacity = parse_opacity(value)?,
            "stroke-opacity" => self.stroke_opacity = parse_opacity(value)?,
            "fill-rule" => {
                self.fill_rule = match value {
                    "nonzero" => FillRule::NonZero,
                    "evenodd" => FillRule::EvenOdd,
                    _ => return Err(format!("invalid fill-rule {value:?}")),
                }
            }
            "stroke-width" => {
                let width = to_user_units(parse_length(value)?, normalized_diagonal(viewport));
                if width < 0.0 {
                    return Err(format!("stroke-width must not be negative, got {value:?}"));
                }
                self.stroke_width = width;
            }
            "stroke-linecap" => {
                self.line_cap = match value {
                    "butt" => LineCap::Butt,
                    "round" => LineCap::Round,
                    "square" => LineCap::Square,
                    _ => return Err(format!("invalid stroke-linecap {value:?}")),
                }
            }
            "stroke-linejoin" => {
                self.line_join = match value {
                    "miter" | "miter-clip" | "arcs" => LineJoin::Miter,
                    "round" => LineJoin::Round,
                    "bevel" => LineJoin::Bevel,
                    _ => return Err(format!("invalid stroke-linejoin {value:?}")),
                }
            }
            "stroke-miterlimit" => {
                let limit = parse_number(value)?;
                if limit < 1.0 {
                    return Err(format!("stroke-miterlimit must be at least 1, got {value:?}"));
                }
                self.miter_limit = limit;
            }
            "stroke-dasharray" => {
                self.dash_array = if value == "none" {
                    None
                } else {
                    let reference = normalized_diagonal(viewport);
                    let array = svgtypes::LengthListParser::from(value)
                        .map(|len| {
                            len.map(|len| to_user_units(len, reference))
                                .map_err(|e| format!("invalid stroke-dasharray {value:?}: {e}"))
                        })
                        .collect::<PropResult<Vec<f64>>>()?;
                    Some(array)
                }
            }
            "stroke-dashoffset" => {
                self.dash_offset =
                    to_user_units(parse_length(value)?, normalized_diagonal(viewport))
            }
            "color" => {
                let color = svgtypes::Color::from_str(value)
                    .map_err(|e| format!("invalid color {value:?}: {e}"))?;
                self.color = (
                    Color::rgb(color.red, color.green, color.blue),
                    color.alpha as f64 / 255.0,
                );
            }
            "visibility" => {
                self.visible = match value {
                    "visible" => true,
                    "hidden" | "collapse" => false,
                    _ => return Err(format!("invalid visibility {value:?}")),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn paint_color(&self, paint: PaintSpec) -> Option<(Color, f64)> {
        match paint {
            PaintSpec::None => None,
            PaintSpec::Color(color, alpha) => Some((color, alpha)),
            PaintSpec::CurrentColor => Some(self.color),
        }
    }

    /// Style for a shape element using this cascade
    fn resolve(&self) -> Style {
        if !self.visible {
            return Style::none();
        }
        let fill = self.paint_color(self.fill).map(|(color, alpha)| Fill {
            color,
            opacity: self.fill_opacity * alpha,
            rule: self.fill_rule,
        });
        let stroke = self
            .paint_color(self.stroke)
            .filter(|_| self.stroke_width > 0.0)
            .map(|(color, alpha)| StrokeStyle {
                color,
                opacity: self.stroke_opacity * alpha,
                width: self.stroke_width,
                cap: self.line_cap,
                join: self.line_join,
                miter_limit: self.miter_limit,
                dash: self
                    .dash_array
                    .clone()
                    .and_then(|array| Dash::new(array, self.dash_offset)),
            });
        Style { fill, stroke }
    }
}

/// Per-element state after applying its declarations
struct ElementProps {
    cascade: Cascade,
    opacity: f64,
    transform: Transform,
}

/// Presentation attributes followed by `style` declarations, so the latter win
fn declarations<'a, 'input: 'a>(node: roxmltree::Node<'a, 'input>) -> Vec<(&'a str, &'a str)> {
    let mut decls: Vec<(&'a str, &'a str)> = node
        .attributes()
        .filter(|attr| attr.namespace().is_none())
        .map(|attr| (attr.name(), attr.value().trim()))
        .collect();
    if let Some(style) = node.attribute("style") {
        for decl in style.split(';') {
            if let Some((name, value)) = decl.split_once(':') {
                let value = value.trim();
                let value = value.strip_suffix("!important").map_or(value, str::trim_end);
                decls.push((name.trim(), value));
            }
        }
    }
    decls
}

// ─────────────────────────────────────────────────────────────────────────────
// Elements
// ─────────────────────────────────────────────────────────────────────────────

struct Parser<'a, 'input> {
    xml: &'a roxmltree::Document<'input>,
    doc: Document,
    viewport: Size,
}

impl Parser<'_, '_> {
    fn position(&self, node: roxmltree::Node<'_, '_>) -> roxmltree::TextPos {
        self.xml.text_pos_at(node.range().start)
    }

    /// `None` when the element is not displayed
    fn element_props(
        &self,
        node: roxmltree::Node<'_, '_>,
        inherited: &Cascade,
    ) -> Result<Option<ElementProps>> {
        let decls = declarations(node);
        if decls.iter().any(|&(name, value)| name == "display" && value == "none") {
            return Ok(None);
        }

        let pos = self.position(node);
        let mut props = ElementProps {
            cascade: inherited.clone(),
            opacity: 1.0,
            transform: Transform::IDENTITY,
        };
        for &(name, value) in &decls {
            match name {
                "opacity" if value != "inherit" => {
                    props.opacity =
                        parse_opacity(value).map_err(|msg| SvgError::parse_at(pos, msg))?
                }
                _ => props
                    .cascade
                    .apply(name, value, self.viewport)
                    .map_err(|msg| SvgError::parse_at(pos, msg))?,
            }
        }
        if let Some(value) = node.attribute("transform") {
            props.transform = parse_transform(value).map_err(|msg| SvgError::parse_at(pos, msg))?;
        }
        Ok(Some(props))
    }

    fn convert_children(
        &mut self,
        parent_node: roxmltree::Node<'_, '_>,
        parent: NodeId,
        cascade: &Cascade,
    ) -> Result<()> {
        for child in parent_node.children().filter(|n| n.is_element()) {
            self.convert_element(child, parent, cascade)?;
        }
        Ok(())
    }

    fn convert_element(
        &mut self,
        node: roxmltree::Node<'_, '_>,
        parent: NodeId,
        inherited: &Cascade,
    ) -> Result<()> {
        let tag = node.tag_name().name();
        let is_group = match tag {
            "g" | "a" => true,
            "path" | "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" => false,
            _ => {
                debug!("skipping unsupported <{}> element", tag);
                return Ok(());
            }
        };

        let Some(props) = self.element_props(node, inherited)? else {
            debug!("skipping <{}> with display=none", tag);
            return Ok(());
        };
        if !props.transform.is_invertible() {
            debug!("skipping <{}> with a degenerate transform", tag);
            return Ok(());
        }

        let kind = if is_group {
            NodeKind::Group
        } else {
            let pos = self.position(node);
            match self
                .shape_path(node, tag)
                .map_err(|msg| SvgError::parse_at(pos, msg))?
            {
                Some(path) => {
                    let mut style = props.cascade.resolve();
                    if tag == "line" {
                        style.fill = None;
                    }
                    NodeKind::Shape(Shape { path, style })
                }
                None => return Ok(()),
            }
        };

        let mut element = Node::new(kind);
        element.id = node.attribute("id").map(str::to_owned);
        element.transform = props.transform;
        element.opacity = props.opacity;
        let id = self.doc.insert(parent, element)?;

        if is_group {
            self.convert_children(node, id, &props.cascade)?;
        }
        Ok(())
    }

    /// Geometry of a basic shape; `None` when it renders nothing
    fn shape_path(&self, node: roxmltree::Node<'_, '_>, tag: &str) -> PropResult<Option<Path>> {
        let Size { width: vw, height: vh } = self.viewport;
        let diag = normalized_diagonal(self.viewport);
        let len = |name: &str, reference: f64| -> PropResult<Option<f64>> {
            node.attribute(name)
                .map(|v| parse_length(v).map(|l| to_user_units(l, reference)))
                .transpose()
        };

        let path = match tag {
            "path" => match node.attribute("d") {
                Some(d) => parse_path_data(d)?,
                None => return Ok(None),
            },
            "rect" => {
                let (w, h) = (len("width", vw)?.unwrap_or(0.0), len("height", vh)?.unwrap_or(0.0));
                if w <= 0.0 || h <= 0.0 {
                    return Ok(None);
                }
                let (x, y) = (len("x", vw)?.unwrap_or(0.0), len("y", vh)?.unwrap_or(0.0));
                let (rx, ry) = match (len("rx", vw)?, len("ry", vh)?) {
                    (None, None) => (0.0, 0.0),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (Some(rx), Some(ry)) => (rx, ry),
                };
                Path::rounded_rect(Rect::new(x, y, w, h), rx, ry)
            }
            "circle" => {
                let r = len("r", diag)?.unwrap_or(0.0);
                if r <= 0.0 {
                    return Ok(None);
                }
                let center = Point::new(
                    len("cx", vw)?.unwrap_or(0.0),
                    len("cy", vh)?.unwrap_or(0.0),
                );
                Path::circle(center, r)
            }
            "ellipse" => {
                let (rx, ry) = match (len("rx", vw)?, len("ry", vh)?) {
                    (None, None) => return Ok(None),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (Some(rx), Some(ry)) => (rx, ry),
                };
                if rx <= 0.0 || ry <= 0.0 {
                    return Ok(None);
                }
                let center = Point::new(
                    len("cx", vw)?.unwrap_or(0.0),
                    len("cy", vh)?.unwrap_or(0.0),
                );
                Path::ellipse(center, rx, ry)
            }
            "line" => Path::line(
                Point::new(len("x1", vw)?.unwrap_or(0.0), len("y1", vh)?.unwrap_or(0.0)),
                Point::new(len("x2", vw)?.unwrap_or(0.0), len("y2", vh)?.unwrap_or(0.0)),
            ),
            "polyline" | "polygon" => {
                let text = node.attribute("points").unwrap_or("");
                let points: Vec<Point> = svgtypes::PointsParser::from(text)
                    .map(|(x, y)| Point::new(x, y))
                    .collect();
                if points.len() < 2 {
                    return Ok(None);
                }
                Path::polyline(&points, tag == "polygon")
            }
            _ => return Ok(None),
        };

        if path.is_empty() {
            return Ok(None);
        }
        path.validate().map_err(|e| e.to_string())?;
        Ok(Some(path))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Micro-syntax
// ─────────────────────────────────────────────────────────────────────────────

/// Path data normalized to absolute M/L/Q/C/Z
fn parse_path_data(d: &str) -> PropResult<Path> {
    use svgtypes::SimplePathSegment as Seg;

    let mut path = Path::new();
    for segment in svgtypes::SimplifyingPathParser::from(d) {
        let segment = segment.map_err(|e| format!("invalid path data: {e}"))?;
        path = match segment {
            Seg::MoveTo { x, y } => path.move_to(x, y),
            Seg::LineTo { x, y } => path.line_to(x, y),
            Seg::Quadratic { x1, y1, x, y } => path.quad_to(x1, y1, x, y),
            Seg::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => path.cubic_to(x1, y1, x2, y2, x, y),
            Seg::ClosePath => path.close(),
        };
    }
    Ok(path)
}

fn parse_paint(value: &str) -> PropResult<PaintSpec> {
    let paint =
        svgtypes::Paint::from_str(value).map_err(|e| format!("invalid paint {value:?}: {e}"))?;
    let color = |c: svgtypes::Color| {
        PaintSpec::Color(Color::rgb(c.red, c.green, c.blue), c.alpha as f64 / 255.0)
    };
    Ok(match paint {
        svgtypes::Paint::None => PaintSpec::None,
        svgtypes::Paint::CurrentColor => PaintSpec::CurrentColor,
        svgtypes::Paint::Color(c) => color(c),
        svgtypes::Paint::FuncIRI(iri, fallback) => {
            warn!("paint server #{} is not supported, using its fallback", iri);
            match fallback {
                Some(PaintFallback::Color(c)) => color(c),
                Some(PaintFallback::CurrentColor) => PaintSpec::CurrentColor,
                Some(PaintFallback::None) | None => PaintSpec::None,
            }
        }
        _ => {
            debug!("paint {:?} is not supported, using none", value);
            PaintSpec::None
        }
    })
}

fn parse_transform(value: &str) -> PropResult<Transform> {
    let ts = svgtypes::Transform::from_str(value)
        .map_err(|e| format!("invalid transform {value:?}: {e}"))?;
    Ok(Transform::new(ts.a, ts.b, ts.c, ts.d, ts.e, ts.f))
}

fn parse_length(value: &str) -> PropResult<Length> {
    Length::from_str(value).map_err(|e| format!("invalid length {value:?}: {e}"))
}

fn parse_number(value: &str) -> PropResult<f64> {
    svgtypes::Number::from_str(value)
        .map(|n| n.0)
        .map_err(|e| format!("invalid number {value:?}: {e}"))
}

/// A plain number or a percentage, clamped to [0, 1]
fn parse_opacity(value: &str) -> PropResult<f64> {
    let length = parse_length(value)?;
    let opacity = match length.unit {
        LengthUnit::None => length.number,
        LengthUnit::Percent => length.number / 100.0,
        _ => return Err(format!("invalid opacity {value:?}")),
    };
    Ok(opacity.clamp(0.0, 1.0))
}

/// Convert to user units; percentages resolve against `reference`
fn to_user_units(length: Length, reference: f64) -> f64 {
    let n = length.number;
    match length.unit {
        LengthUnit::None | LengthUnit::Px => n,
        LengthUnit::Em => n * FONT_SIZE,
        LengthUnit::Ex => n * FONT_SIZE / 2.0,
        LengthUnit::In => n * DPI,
        LengthUnit::Cm => n * DPI / 2.54,
        LengthUnit::Mm => n * DPI / 25.4,
        LengthUnit::Pt => n * DPI / 72.0,
        LengthUnit::Pc => n * DPI / 6.0,
        LengthUnit::Percent => n * reference / 100.0,
    }
}

/// Reference length for percentages that are neither horizontal nor vertical
fn normalized_diagonal(viewport: Size) -> f64 {
    ((viewport.width * viewport.width + viewport.height * viewport.height) / 2.0).sqrt()
}
