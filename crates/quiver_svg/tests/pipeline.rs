//! End-to-end checks across parse, simplify, bounds, crop, render and serialize

use quiver_svg::{
    BBox, Bitmap, Color, Dash, Document, Fill, FillRule, LineCap, LineJoin, Path, PathCommand,
    Point, Rect, RenderOptions, StrokeStyle, Style, SvgError, Transform,
};

const ARCH: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
  <path d="M 0 0 C 0 10 10 10 10 0"/>
</svg>"#;

const SCENE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="160" viewBox="0 0 120 80">
  <g id="shapes" fill="#3366cc" stroke="#112244" stroke-width="1.5" transform="translate(4 2)">
    <circle cx="25" cy="25" r="18"/>
    <rect x="50" y="8" width="30" height="34" rx="6" fill-opacity="0.7"/>
    <g opacity="0.5" transform="rotate(15 90 60)">
      <ellipse cx="90" cy="55" rx="20" ry="10" fill="orange"/>
      <rect x="80" y="45" width="20" height="20" fill="red"/>
    </g>
  </g>
  <path d="M 5 70 Q 30 50 55 70 T 105 70" fill="none" stroke="green"
        stroke-width="3" stroke-linecap="round" stroke-dasharray="8 4"/>
  <path d="M 60 60 h 20 v 15 h -20 z M 65 64 h 10 v 7 h -10 z" fill-rule="evenodd"/>
</svg>"##;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn rasterize(doc: &Document, scale: f64) -> Bitmap {
    doc.rasterize(&RenderOptions::new().with_scale(scale))
        .expect("document renders")
}

/// Pixels whose alpha differs by more than `threshold`
fn alpha_mismatches(a: &[u8], b: &[u8], threshold: u8) -> usize {
    assert_eq!(a.len(), b.len());
    a.chunks_exact(4)
        .zip(b.chunks_exact(4))
        .filter(|(pa, pb)| pa[3].abs_diff(pb[3]) > threshold)
        .count()
}

fn assert_close(actual: f64, expected: f64, eps: f64) {
    assert!(
        (actual - expected).abs() <= eps,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_arch_simplifies_and_renders_alike() {
    init_tracing();
    let original = Document::parse(ARCH).unwrap();
    let mut simplified = original.clone();

    let report = simplified.simplify_curves(0.01).unwrap();
    assert_eq!(report.cubics_converted, 1);
    assert!(report.within_tolerance());
    assert!(report.max_error <= 0.01);

    let path = &simplified.shapes()[0].shape.path;
    let commands = path.commands();
    assert!(commands
        .iter()
        .any(|c| matches!(c, PathCommand::QuadTo { .. })));
    assert!(!path.has_cubics());

    let before = rasterize(&original, 10.0);
    let after = rasterize(&simplified, 10.0);
    assert_eq!(before.dimensions(), (100, 100));
    assert!(alpha_mismatches(&before.pixels, &after.pixels, 32) <= 4);
}

#[test]
fn test_simplified_scene_has_no_cubics() {
    let mut doc = Document::parse(SCENE).unwrap();
    doc.simplify_curves(0.05).unwrap();
    for instance in doc.shapes() {
        assert!(!instance.shape.path.has_cubics());
    }
    // A second pass has nothing left to convert
    assert_eq!(doc.simplify_curves(0.05).unwrap().cubics_converted, 0);
}

#[test]
fn test_compute_bbox_is_idempotent() {
    let doc = Document::parse(SCENE).unwrap();
    let first = doc.compute_bbox();
    assert!(!first.is_empty());
    assert_eq!(first, doc.compute_bbox());
}

#[test]
fn test_crop_to_bbox_moves_content_to_origin() {
    init_tracing();
    let mut doc = Document::parse(SCENE).unwrap();
    let bbox = doc.compute_bbox().rect().unwrap();

    doc.crop(bbox).unwrap();
    let cropped = doc.compute_bbox().rect().unwrap();
    assert_close(cropped.x(), 0.0, 1e-3);
    assert_close(cropped.y(), 0.0, 1e-3);
    assert_close(cropped.width(), bbox.width(), 1e-3);
    assert_close(cropped.height(), bbox.height(), 1e-3);
    assert_eq!(doc.width(), Some(bbox.width()));
    assert_eq!(doc.height(), Some(bbox.height()));
}

#[test]
fn test_cropped_render_keeps_content() {
    let mut doc = Document::parse(ARCH).unwrap();
    doc.crop(doc.compute_bbox()).unwrap();
    let bitmap = rasterize(&doc, 4.0);
    // 10 x 7.5 units at 4 px per unit
    assert_eq!(bitmap.dimensions(), (40, 30));
    assert_eq!(bitmap.pixel(20, 2).map(|px| px[3]), Some(255));
}

#[test]
fn test_render_is_deterministic() {
    let doc = Document::parse(SCENE).unwrap();
    assert_eq!(doc.render(1.5).unwrap(), doc.render(1.5).unwrap());
}

#[test]
fn test_png_decodes_to_rendered_size() {
    let doc = Document::parse(SCENE).unwrap();
    let png = doc.render(0.5).unwrap();
    let pixmap = tiny_skia::Pixmap::decode_png(&png).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (120, 80));

    let fitted = doc
        .render_with(&RenderOptions::new().with_fit_width(60))
        .unwrap();
    let pixmap = tiny_skia::Pixmap::decode_png(&fitted).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (60, 40));
}

#[test]
fn test_serialize_round_trip_renders_identically() {
    for source in [ARCH, SCENE] {
        let mut doc = Document::parse(source).unwrap();
        let reparsed = Document::parse(&doc.serialize()).unwrap();
        assert_eq!(rasterize(&doc, 2.0), rasterize(&reparsed, 2.0));

        // Cropped and simplified state survives as well
        doc.simplify_curves(0.1).unwrap();
        doc.crop(doc.compute_bbox()).unwrap();
        let reparsed = Document::parse(&doc.to_string()).unwrap();
        assert_eq!(reparsed.canvas(), doc.canvas());
        assert_eq!(rasterize(&doc, 2.0), rasterize(&reparsed, 2.0));
    }
}

#[test]
fn test_built_document_round_trips() {
    let mut doc = Document::new(40.0, 30.0).unwrap();
    let group = doc
        .add_group(doc.root(), Transform::translation(4.0, 3.0))
        .unwrap();
    doc.set_opacity(group, 0.6).unwrap();

    let mut fill = Fill::new(Color::rgb(200, 40, 90));
    fill.opacity = 0.35;
    fill.rule = FillRule::EvenOdd;
    let mut stroke = StrokeStyle::new(Color::rgb(10, 10, 120), 2.0);
    stroke.miter_limit = 1.0;
    stroke.join = LineJoin::Bevel;
    stroke.cap = LineCap::Square;
    stroke.dash = Dash::new(vec![3.0, 1.5], 0.25);
    doc.add_shape(
        group,
        Path::rounded_rect(Rect::new(2.0, 2.0, 20.0, 14.0), 3.0, 2.0),
        Style::none().with_fill(fill).with_stroke(stroke),
    )
    .unwrap();
    doc.add_shape(
        doc.root(),
        Path::circle(Point::new(30.0, 20.0), 6.0),
        Style::none().with_stroke(StrokeStyle::new(Color::BLACK, 0.0)),
    )
    .unwrap();

    let reparsed = Document::parse(&doc.serialize()).unwrap();
    assert_eq!(rasterize(&doc, 2.0), rasterize(&reparsed, 2.0));
}

#[test]
fn test_add_shape_rejects_styles_svg_cannot_express() {
    let mut doc = Document::new(10.0, 10.0).unwrap();
    let square = || Path::rect(Rect::new(0.0, 0.0, 10.0, 10.0));

    let mut fill = Fill::new(Color::BLACK);
    fill.opacity = f64::NAN;
    let mut mitered = StrokeStyle::new(Color::BLACK, 1.0);
    mitered.miter_limit = 0.5;
    let rejected = [
        Style::none().with_fill(fill),
        Style::none().with_stroke(mitered),
        Style::none().with_stroke(StrokeStyle::new(Color::BLACK, -1.0)),
        Style::none().with_stroke(StrokeStyle::new(Color::BLACK, f64::NAN)),
    ];
    for style in rejected {
        assert!(matches!(
            doc.add_shape(doc.root(), square(), style),
            Err(SvgError::Input(_))
        ));
    }
    assert!(doc.children(doc.root()).is_empty());
}

#[test]
fn test_round_trip_keeps_ids() {
    let doc = Document::parse(SCENE).unwrap();
    let reparsed = Document::parse(&doc.serialize()).unwrap();
    let id = reparsed.node_by_id("shapes").unwrap();
    assert_eq!(reparsed.children(id).len(), 3);
}

#[test]
fn test_invalid_inputs() {
    let mut doc = Document::parse(SCENE).unwrap();
    assert!(matches!(
        doc.crop(BBox::new(10.0, 10.0, 0.0, 5.0)),
        Err(SvgError::Input(_))
    ));
    assert!(matches!(doc.simplify_curves(0.0), Err(SvgError::Input(_))));
    assert!(matches!(doc.render(0.0), Err(SvgError::Input(_))));

    let mut unpainted = Document::parse(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
             <rect width="5" height="5" fill="none"/>
             <circle cx="5" cy="5" r="2" opacity="0"/>
             <line x2="10" stroke="black" stroke-opacity="0"/>
           </svg>"#,
    )
    .unwrap();
    let bbox = unpainted.compute_bbox();
    assert_eq!(bbox, BBox::Empty);
    assert!(matches!(unpainted.crop(bbox), Err(SvgError::Input(_))));
}

#[test]
fn test_document_without_canvas_cannot_render() {
    let doc = Document::parse(
        r#"<svg xmlns="http://www.w3.org/2000/svg"><rect width="5" height="5"/></svg>"#,
    )
    .unwrap();
    assert_eq!(doc.canvas(), None);
    assert!(matches!(doc.render(1.0), Err(SvgError::Render(_))));
    // Bounds do not need a canvas
    assert_eq!(doc.compute_bbox(), BBox::new(0.0, 0.0, 5.0, 5.0));
}

#[test]
fn test_output_matches_reference_renderer() {
    let doc = Document::parse(SCENE).unwrap();
    let ours = rasterize(&doc, 1.0);

    let tree = usvg::Tree::from_str(&doc.serialize(), &usvg::Options::default()).unwrap();
    let mut reference = resvg::tiny_skia::Pixmap::new(ours.width, ours.height).unwrap();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut reference.as_mut(),
    );

    let total = (ours.width * ours.height) as usize;
    let mismatched = alpha_mismatches(&ours.pixels, reference.data(), 64);
    assert!(
        mismatched * 100 < total,
        "{mismatched} of {total} pixels differ from the reference renderer"
    );
}
