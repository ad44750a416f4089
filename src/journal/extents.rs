//! Conservative device-space bounds of drawing operations.
//!
//! Every estimate may cover more pixels than the operation really touches but never fewer: the
//! result drives both dirty-rectangle accumulation and per-tile culling during replay.

use kurbo::{Rect, Shape};

use crate::foundation::core::IntRect;
use crate::paint::clip::Clip;
use crate::paint::glyph::GlyphRun;
use crate::paint::pattern::Pattern;
use crate::paint::shape::{FillParams, StrokeParams};
use crate::paint::style::Operator;

fn base_extents(op: Operator, source: &Pattern, clip: &Clip) -> IntRect {
    let mut extents = clip.extents();
    if op.is_bounded_by_source()
        && let Some(src) = source.bounded_extents()
    {
        extents = extents.intersect(src);
    }
    extents
}

fn narrow_to_shape(op: Operator, extents: IntRect, shape: IntRect) -> IntRect {
    if op.is_bounded_by_mask() {
        extents.intersect(shape)
    } else {
        extents
    }
}

/// Extents of painting `source` through `clip`.
pub fn paint_extents(op: Operator, source: &Pattern, clip: &Clip) -> IntRect {
    base_extents(op, source, clip)
}

/// Extents of painting `source` through the alpha of `mask`.
pub fn mask_extents(op: Operator, source: &Pattern, mask: &Pattern, clip: &Clip) -> IntRect {
    let extents = base_extents(op, source, clip);
    match mask.bounded_extents() {
        Some(m) => narrow_to_shape(op, extents, m),
        None => extents,
    }
}

/// Extents of filling a path.
pub fn fill_extents(op: Operator, source: &Pattern, fill: &FillParams, clip: &Clip) -> IntRect {
    let extents = base_extents(op, source, clip);
    let shape = IntRect::from_rect_outer(fill.path.bounding_box());
    narrow_to_shape(op, extents, shape)
}

/// Extents of stroking a path; the path bounds grow by the pen's reach in device space.
pub fn stroke_extents(
    op: Operator,
    source: &Pattern,
    stroke: &StrokeParams,
    clip: &Clip,
) -> IntRect {
    let extents = base_extents(op, source, clip);
    if !op.is_bounded_by_mask() {
        return extents;
    }
    if stroke.path.elements().is_empty() {
        return IntRect::empty();
    }
    let (dx, dy) = stroke.style.max_device_distance(stroke.ctm);
    let bbox = stroke.path.bounding_box();
    // Flattening error can push coverage past the exact pen reach.
    let pad = stroke.tolerance.abs();
    let grown = Rect::new(
        bbox.x0 - dx - pad,
        bbox.y0 - dy - pad,
        bbox.x1 + dx + pad,
        bbox.y1 + dy + pad,
    );
    extents.intersect(IntRect::from_rect_outer(grown))
}

/// Extents of drawing a glyph run.
pub fn glyphs_extents(op: Operator, source: &Pattern, run: &GlyphRun, clip: &Clip) -> IntRect {
    let extents = base_extents(op, source, clip);
    let shape = run
        .bounds()
        .map(IntRect::from_rect_outer)
        .unwrap_or_else(IntRect::empty);
    narrow_to_shape(op, extents, shape)
}

#[cfg(test)]
#[path = "../../tests/unit/journal/extents.rs"]
mod tests;
