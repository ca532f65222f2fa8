//! Resolved paint styles and their conversion to tiny-skia

use std::fmt;

/// Opaque sRGB color
///
/// Alpha never lives here: color alpha is folded into the owning fill or
/// stroke opacity when a document is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse any CSS color syntax, discarding its alpha
    pub fn parse(text: &str) -> Option<Color> {
        text.parse::<svgtypes::Color>()
            .ok()
            .map(|c| Color::rgb(c.red, c.green, c.blue))
    }

    pub(crate) fn to_skia(self, opacity: f64) -> tiny_skia::Color {
        let mut color = tiny_skia::Color::from_rgba8(self.r, self.g, self.b, 255);
        color.apply_opacity(opacity as f32);
        color
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Solid fill
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub color: Color,
    /// In [0, 1]
    pub opacity: f64,
    pub rule: FillRule,
}

impl Fill {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            opacity: 1.0,
            rule: FillRule::NonZero,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Dash pattern with an even number of non-negative entries and a positive sum
#[derive(Clone, Debug, PartialEq)]
pub struct Dash {
    array: Vec<f64>,
    pub offset: f64,
}

impl Dash {
    /// Normalizes an odd-length list by repeating it; `None` for patterns
    /// that draw nothing useful (empty, negative or zero-sum)
    pub fn new(mut array: Vec<f64>, offset: f64) -> Option<Dash> {
        if array.is_empty() || array.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return None;
        }
        if array.iter().sum::<f64>() <= 0.0 || !offset.is_finite() {
            return None;
        }
        if array.len() % 2 == 1 {
            array.extend_from_within(..);
        }
        Some(Dash { array, offset })
    }

    pub fn array(&self) -> &[f64] {
        &self.array
    }
}

/// Solid stroke and its outline parameters
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    /// In [0, 1]
    pub opacity: f64,
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: Option<Dash>,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f64) -> Self {
        Self {
            color,
            opacity: 1.0,
            width,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 4.0,
            dash: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.width > 0.0
    }

    pub(crate) fn to_skia(&self) -> tiny_skia::Stroke {
        tiny_skia::Stroke {
            width: self.width as f32,
            miter_limit: self.miter_limit as f32,
            line_cap: match self.cap {
                LineCap::Butt => tiny_skia::LineCap::Butt,
                LineCap::Round => tiny_skia::LineCap::Round,
                LineCap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.join {
                LineJoin::Miter => tiny_skia::LineJoin::Miter,
                LineJoin::Round => tiny_skia::LineJoin::Round,
                LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
            },
            dash: self.dash.as_ref().and_then(|dash| {
                tiny_skia::StrokeDash::new(
                    dash.array.iter().map(|&v| v as f32).collect(),
                    dash.offset as f32,
                )
            }),
        }
    }
}

/// Fully resolved paint of a shape, with nothing inherited
#[derive(Clone, Debug, PartialEq)]
pub struct Style {
    pub fill: Option<Fill>,
    pub stroke: Option<StrokeStyle>,
}

impl Default for Style {
    /// Black non-zero fill, no stroke
    fn default() -> Self {
        Self {
            fill: Some(Fill::new(Color::BLACK)),
            stroke: None,
        }
    }
}

impl Style {
    /// Paints nothing at all
    pub fn none() -> Self {
        Self {
            fill: None,
            stroke: None,
        }
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn with_stroke(mut self, stroke: StrokeStyle) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn visible_fill(&self) -> Option<&Fill> {
        self.fill.as_ref().filter(|f| f.is_visible())
    }

    pub fn visible_stroke(&self) -> Option<&StrokeStyle> {
        self.stroke.as_ref().filter(|s| s.is_visible())
    }

    /// True when either the fill or the stroke would leave a mark
    pub fn is_painted(&self) -> bool {
        self.visible_fill().is_some() || self.visible_stroke().is_some()
    }

    /// Check that every value is one SVG text can express
    pub fn validate(&self) -> Result<(), String> {
        if let Some(fill) = &self.fill {
            check_opacity("fill opacity", fill.opacity)?;
        }
        if let Some(stroke) = &self.stroke {
            check_opacity("stroke opacity", stroke.opacity)?;
            if !stroke.width.is_finite() || stroke.width < 0.0 {
                return Err(format!(
                    "stroke width must be finite and non-negative, got {}",
                    stroke.width
                ));
            }
            if !stroke.miter_limit.is_finite() || stroke.miter_limit < 1.0 {
                return Err(format!(
                    "miter limit must be finite and at least 1, got {}",
                    stroke.miter_limit
                ));
            }
            if let Some(dash) = &stroke.dash {
                if !dash.offset.is_finite() {
                    return Err(format!("dash offset must be finite, got {}", dash.offset));
                }
            }
        }
        Ok(())
    }
}

fn check_opacity(what: &str, value: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{what} must be in [0, 1], got {value}"))
    }
}

pub(crate) fn skia_paint(
    color: Color,
    opacity: f64,
    anti_alias: bool,
) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color(color.to_skia(opacity));
    paint.anti_alias = anti_alias;
    paint
}

pub(crate) fn skia_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse_and_display() {
        assert_eq!(Color::parse("red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#0f0"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::parse("nonsense"), None);
        assert_eq!(Color::rgb(18, 52, 171).to_string(), "#1234ab");
    }

    #[test]
    fn test_dash_normalization() {
        let dash = Dash::new(vec![5.0, 2.0, 1.0], 0.0).unwrap();
        assert_eq!(dash.array(), &[5.0, 2.0, 1.0, 5.0, 2.0, 1.0]);
        assert!(Dash::new(vec![], 0.0).is_none());
        assert!(Dash::new(vec![0.0, 0.0], 0.0).is_none());
        assert!(Dash::new(vec![4.0, -1.0], 0.0).is_none());
    }

    #[test]
    fn test_painted() {
        assert!(Style::default().is_painted());
        assert!(!Style::none().is_painted());

        let mut transparent = Fill::new(Color::BLACK);
        transparent.opacity = 0.0;
        assert!(!Style::none().with_fill(transparent).is_painted());

        let hairline = StrokeStyle::new(Color::BLACK, 0.0);
        assert!(!Style::none().with_stroke(hairline).is_painted());
    }

    #[test]
    fn test_validate_rejects_inexpressible_values() {
        assert!(Style::default().validate().is_ok());

        let mut fill = Fill::new(Color::BLACK);
        fill.opacity = f64::NAN;
        assert!(Style::none().with_fill(fill.clone()).validate().is_err());
        fill.opacity = 1.5;
        assert!(Style::none().with_fill(fill).validate().is_err());

        assert!(Style::none()
            .with_stroke(StrokeStyle::new(Color::BLACK, -1.0))
            .validate()
            .is_err());
        assert!(Style::none()
            .with_stroke(StrokeStyle::new(Color::BLACK, f64::INFINITY))
            .validate()
            .is_err());
        // Zero width is valid, it just paints nothing
        assert!(Style::none()
            .with_stroke(StrokeStyle::new(Color::BLACK, 0.0))
            .validate()
            .is_ok());

        let mut stroke = StrokeStyle::new(Color::BLACK, 1.0);
        stroke.miter_limit = 0.5;
        assert!(Style::none().with_stroke(stroke.clone()).validate().is_err());
        stroke.miter_limit = 1.0;
        stroke.dash = Dash::new(vec![2.0, 1.0], 0.0);
        if let Some(dash) = &mut stroke.dash {
            dash.offset = f64::NAN;
        }
        assert!(Style::none().with_stroke(stroke).validate().is_err());
    }

    #[test]
    fn test_stroke_conversion() {
        let mut stroke = StrokeStyle::new(Color::WHITE, 2.5);
        stroke.cap = LineCap::Round;
        stroke.dash = Dash::new(vec![3.0], 1.0);
        let skia = stroke.to_skia();
        assert_eq!(skia.width, 2.5);
        assert_eq!(skia.line_cap, tiny_skia::LineCap::Round);
        assert!(skia.dash.is_some());
    }
}
