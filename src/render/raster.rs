use std::fmt::Debug;

use kurbo::{BezPath, Point, Shape, StrokeOpts};

use crate::foundation::core::IntRect;
use crate::foundation::error::{DrawStatus, RasterResult};
use crate::paint::clip::Clip;
use crate::paint::glyph::GlyphRun;
use crate::paint::pattern::Pattern;
use crate::paint::shape::{FillParams, StrokeParams};
use crate::paint::style::{Antialias, FillRule, Operator};
use crate::render::composite::composite;
use crate::surface::image::ImageView;

/// Turns one drawing operation into pixels of a target view.
///
/// Called identically for immediate execution, sequential replay and per-tile replay; the
/// target view and clip are the only things that differ. Implementations must only write
/// pixels inside both the view bounds and the clip.
pub trait Rasterizer: Send + Sync + Debug {
    /// Paint `source` everywhere inside `clip`.
    fn paint(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Paint `source` with coverage taken from the alpha of `mask`.
    fn mask(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        mask: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Fill a device-space path.
    fn fill(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        fill: &FillParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Stroke a device-space path with a user-space pen.
    fn stroke(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        stroke: &StrokeParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Draw the outlines of a glyph run.
    fn glyphs(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        run: &GlyphRun,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;
}

/// Reference CPU rasterizer working directly on packed premultiplied pixels.
///
/// Coverage is computed by point sampling the winding number on a regular grid inside each
/// pixel. Every pixel's result depends only on its own coordinates, so drawing into a band view
/// produces exactly the pixels that drawing into the full image produces inside that band.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareRasterizer;

impl SoftwareRasterizer {
    /// Create a rasterizer.
    pub fn new() -> Self {
        Self
    }

    fn region(target: &ImageView, op: Operator, clip: &Clip, shape: Option<IntRect>) -> IntRect {
        let mut region = target.bounds().intersect(clip.extents());
        if op.is_bounded_by_mask()
            && let Some(shape) = shape
        {
            region = region.intersect(shape);
        }
        region
    }

    fn draw(
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
        shape: Option<IntRect>,
        coverage: impl Fn(i32, i32) -> u8,
    ) -> DrawStatus {
        let region = Self::region(target, op, clip, shape);
        if region.is_empty() {
            return DrawStatus::NothingToDo;
        }
        let bounded = op.is_bounded_by_mask();
        for y in region.y..region.bottom() {
            for x in region.x..region.right() {
                if !clip.contains(x, y) {
                    continue;
                }
                let cov = coverage(x, y);
                if bounded && cov == 0 {
                    continue;
                }
                let out = composite(op, source.sample(x, y), target.load(x, y), cov);
                target.store(x, y, out);
            }
        }
        DrawStatus::Drawn
    }

    fn draw_path(
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
        path: &BezPath,
        rule: FillRule,
        antialias: Antialias,
    ) -> DrawStatus {
        let shape = IntRect::from_rect_outer(path.bounding_box());
        if shape.is_empty() && op.is_bounded_by_mask() {
            return DrawStatus::NothingToDo;
        }
        let n = antialias.samples_per_axis();
        let total = n * n;
        let step = 1.0 / f64::from(n);
        Self::draw(target, op, source, clip, Some(shape), |x, y| {
            let mut inside = 0u32;
            for sy in 0..n {
                for sx in 0..n {
                    let p = Point::new(
                        f64::from(x) + (f64::from(sx) + 0.5) * step,
                        f64::from(y) + (f64::from(sy) + 0.5) * step,
                    );
                    if rule.is_inside(path.winding(p)) {
                        inside += 1;
                    }
                }
            }
            ((inside * 255 + total / 2) / total) as u8
        })
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn paint(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        Ok(Self::draw(target, op, source, clip, None, |_, _| 255))
    }

    fn mask(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        mask: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        Ok(Self::draw(
            target,
            op,
            source,
            clip,
            mask.bounded_extents(),
            |x, y| mask.sample(x, y).a,
        ))
    }

    fn fill(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        fill: &FillParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        Ok(Self::draw_path(
            target,
            op,
            source,
            clip,
            &fill.path,
            fill.rule,
            fill.antialias,
        ))
    }

    fn stroke(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        stroke: &StrokeParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        // The pen lives in user space: expand there, then map the outline back to device space.
        let mut user = stroke.path.clone();
        user.apply_affine(stroke.ctm_inverse);
        let mut outline = kurbo::stroke(
            user,
            &stroke.style.to_kurbo(),
            &StrokeOpts::default(),
            stroke.tolerance,
        );
        outline.apply_affine(stroke.ctm);
        Ok(Self::draw_path(
            target,
            op,
            source,
            clip,
            &outline,
            FillRule::Winding,
            stroke.antialias,
        ))
    }

    fn glyphs(
        &self,
        target: &ImageView,
        op: Operator,
        source: &Pattern,
        run: &GlyphRun,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        Ok(Self::draw_path(
            target,
            op,
            source,
            clip,
            &run.outline(),
            FillRule::Winding,
            Antialias::Default,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
