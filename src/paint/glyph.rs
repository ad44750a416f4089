use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Rect, Shape};

use crate::foundation::error::RasterResult;

/// A positioned glyph in device space. `(x, y)` is the glyph origin on the baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph index into the font.
    pub index: u32,
    /// Origin x.
    pub x: f64,
    /// Origin y (baseline).
    pub y: f64,
}

impl Glyph {
    /// Create a positioned glyph.
    pub fn new(index: u32, x: f64, y: f64) -> Self {
        Self { index, x, y }
    }
}

/// A font instance at a fixed size, shared between every journal that draws with it.
///
/// Outlines are supplied in em units (y grows downward, baseline at `y = 0`) and scaled by
/// `size`. Glyph indices without an outline render as a box spanning the advance and ascent.
#[derive(Clone, Debug)]
pub struct ScaledFont {
    size: f64,
    ascent: f64,
    descent: f64,
    advance: f64,
    outlines: HashMap<u32, BezPath>,
}

impl ScaledFont {
    /// Font with default metrics and no outlines.
    pub fn new(size: f64) -> Self {
        Self {
            size,
            ascent: 0.8,
            descent: 0.2,
            advance: 0.6,
            outlines: HashMap::new(),
        }
    }

    /// Return a copy with custom em-relative metrics.
    pub fn with_metrics(mut self, ascent: f64, descent: f64, advance: f64) -> Self {
        self.ascent = ascent;
        self.descent = descent;
        self.advance = advance;
        self
    }

    /// Return a copy with an outline registered for `index`.
    pub fn with_glyph(mut self, index: u32, outline_em: BezPath) -> Self {
        self.outlines.insert(index, outline_em);
        self
    }

    /// Font size in device pixels per em.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Horizontal advance in device pixels.
    pub fn advance(&self) -> f64 {
        self.advance * self.size
    }

    fn glyph_transform(&self, glyph: &Glyph) -> Affine {
        Affine::translate((glyph.x, glyph.y)) * Affine::scale(self.size)
    }

    fn fallback_box(&self) -> Rect {
        Rect::new(0.0, -self.ascent, self.advance, 0.0)
    }

    /// Device-space outline of one positioned glyph.
    pub fn glyph_path(&self, glyph: &Glyph) -> BezPath {
        let mut path = match self.outlines.get(&glyph.index) {
            Some(outline) => outline.clone(),
            None => self.fallback_box().to_path(0.1),
        };
        path.apply_affine(self.glyph_transform(glyph));
        path
    }

    /// Conservative device-space bounds of one positioned glyph.
    pub fn glyph_bounds(&self, glyph: &Glyph) -> Rect {
        let em = match self.outlines.get(&glyph.index) {
            Some(outline) => outline.bounding_box(),
            None => self.fallback_box(),
        };
        // Vertical metrics cover outlines that do not reach the ascent/descent lines.
        let em = em.union(Rect::new(em.x0, -self.ascent, em.x1, self.descent));
        self.glyph_transform(glyph).transform_rect_bbox(em)
    }

    /// Union of the bounds of every glyph in a run; `None` for an empty run.
    pub fn run_bounds(&self, glyphs: &[Glyph]) -> Option<Rect> {
        glyphs
            .iter()
            .map(|g| self.glyph_bounds(g))
            .reduce(|a, b| a.union(b))
    }
}

/// Glyphs drawn with one font.
///
/// The glyph array is owned; the font is a shared handle because its lifetime spans every
/// journal that references it.
#[derive(Clone, Debug)]
pub struct GlyphRun {
    /// Positioned glyphs.
    pub glyphs: Vec<Glyph>,
    /// Font providing outlines and metrics.
    pub font: Arc<ScaledFont>,
}

impl GlyphRun {
    /// Run of `glyphs` in `font`.
    pub fn new(glyphs: Vec<Glyph>, font: Arc<ScaledFont>) -> Self {
        Self { glyphs, font }
    }

    /// Copy whose glyph array is freshly allocated and whose font reference is retained.
    pub(crate) fn try_clone(&self) -> RasterResult<Self> {
        let mut glyphs = Vec::new();
        glyphs.try_reserve_exact(self.glyphs.len())?;
        glyphs.extend_from_slice(&self.glyphs);
        Ok(Self {
            glyphs,
            font: Arc::clone(&self.font),
        })
    }

    /// Conservative device-space bounds of the run.
    pub fn bounds(&self) -> Option<Rect> {
        self.font.run_bounds(&self.glyphs)
    }

    /// Combined device-space outline of every glyph.
    pub fn outline(&self) -> BezPath {
        let mut path = BezPath::new();
        for g in &self.glyphs {
            path.extend(self.font.glyph_path(g));
        }
        path
    }
}

#[cfg(test)]
#[path = "../../tests/unit/paint/glyph.rs"]
mod tests;
