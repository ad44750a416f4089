use super::*;

#[test]
fn fallback_glyph_bounds_cover_ascent_and_descent() {
    let font = ScaledFont::new(10.0);
    let r = font.glyph_bounds(&Glyph::new(7, 20.0, 30.0));
    assert!((r.x0 - 20.0).abs() < 1e-9);
    assert!((r.x1 - 26.0).abs() < 1e-9);
    assert!((r.y0 - 22.0).abs() < 1e-9);
    assert!((r.y1 - 32.0).abs() < 1e-9);
}

#[test]
fn run_bounds_union_all_glyphs() {
    let font = ScaledFont::new(10.0);
    let run = [Glyph::new(1, 0.0, 10.0), Glyph::new(2, 50.0, 10.0)];
    let r = font.run_bounds(&run).unwrap();
    assert!((r.x0 - 0.0).abs() < 1e-9);
    assert!((r.x1 - 56.0).abs() < 1e-9);
    assert!(font.run_bounds(&[]).is_none());
}

#[test]
fn custom_outline_is_scaled_and_translated() {
    let outline = Rect::new(0.0, -0.5, 0.25, 0.0).to_path(0.1);
    let font = ScaledFont::new(8.0).with_glyph(3, outline);
    let bbox = font.glyph_path(&Glyph::new(3, 4.0, 4.0)).bounding_box();
    assert!((bbox.x0 - 4.0).abs() < 1e-9);
    assert!((bbox.x1 - 6.0).abs() < 1e-9);
    assert!((bbox.y0 - 0.0).abs() < 1e-9);
    assert!((bbox.y1 - 4.0).abs() < 1e-9);
}

#[test]
fn run_copy_retains_font_and_owns_glyphs() {
    let font = Arc::new(ScaledFont::new(12.0));
    let mut glyphs = vec![Glyph::new(1, 0.0, 12.0)];
    let run = GlyphRun::new(glyphs.clone(), font.clone());
    let copy = run.try_clone().unwrap();
    glyphs.push(Glyph::new(2, 10.0, 12.0));
    assert_eq!(copy.glyphs.len(), 1);
    assert!(Arc::ptr_eq(&copy.font, &font));
    assert_eq!(Arc::strong_count(&font), 3);
}

#[test]
fn run_outline_contains_every_glyph() {
    let font = Arc::new(ScaledFont::new(10.0));
    let run = GlyphRun::new(
        vec![Glyph::new(1, 0.0, 10.0), Glyph::new(2, 20.0, 10.0)],
        font,
    );
    let outline = run.outline();
    assert_ne!(outline.winding(kurbo::Point::new(3.0, 6.0)), 0);
    assert_ne!(outline.winding(kurbo::Point::new(23.0, 6.0)), 0);
    assert_eq!(outline.winding(kurbo::Point::new(13.0, 6.0)), 0);
}
