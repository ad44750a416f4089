use std::borrow::Cow;
use std::sync::Arc;

use crate::foundation::core::IntRect;
use crate::foundation::error::{DrawStatus, RasterError, RasterResult};
use crate::journal::JournalSnapshot;
use crate::journal::entry::{Entry, EntryKind};
use crate::paint::clip::Clip;
use crate::paint::glyph::GlyphRun;
use crate::paint::pattern::Pattern;
use crate::paint::shape::{FillParams, StrokeParams};
use crate::paint::style::Operator;
use crate::render::raster::Rasterizer;
use crate::render::tile::Tile;
use crate::surface::image::ImageView;

/// Execution target for replayed entries.
///
/// The dispatcher calls exactly one of these per entry, with the entry's clip already narrowed
/// to the replay restriction.
pub trait ReplayBackend {
    /// Replay a paint entry.
    fn paint(&self, op: Operator, source: &Pattern, clip: &Clip) -> RasterResult<DrawStatus>;

    /// Replay a mask entry.
    fn mask(
        &self,
        op: Operator,
        source: &Pattern,
        mask: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Replay a fill entry.
    fn fill(
        &self,
        op: Operator,
        source: &Pattern,
        fill: &FillParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Replay a stroke entry.
    fn stroke(
        &self,
        op: Operator,
        source: &Pattern,
        stroke: &StrokeParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;

    /// Replay a glyph entry.
    fn glyphs(
        &self,
        op: Operator,
        source: &Pattern,
        run: &GlyphRun,
        clip: &Clip,
    ) -> RasterResult<DrawStatus>;
}

/// A backend that forwards every entry to a rasterizer drawing into one view.
pub trait ViewBackend {
    /// Rasterizer executing the entries.
    fn rasterizer(&self) -> &dyn Rasterizer;
    /// View receiving the pixels.
    fn target(&self) -> &ImageView;
}

impl<T: ViewBackend> ReplayBackend for T {
    fn paint(&self, op: Operator, source: &Pattern, clip: &Clip) -> RasterResult<DrawStatus> {
        self.rasterizer().paint(self.target(), op, source, clip)
    }

    fn mask(
        &self,
        op: Operator,
        source: &Pattern,
        mask: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.rasterizer()
            .mask(self.target(), op, source, mask, clip)
    }

    fn fill(
        &self,
        op: Operator,
        source: &Pattern,
        fill: &FillParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.rasterizer()
            .fill(self.target(), op, source, fill, clip)
    }

    fn stroke(
        &self,
        op: Operator,
        source: &Pattern,
        stroke: &StrokeParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.rasterizer()
            .stroke(self.target(), op, source, stroke, clip)
    }

    fn glyphs(
        &self,
        op: Operator,
        source: &Pattern,
        run: &GlyphRun,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.rasterizer()
            .glyphs(self.target(), op, source, run, clip)
    }
}

/// Executes entries on the whole destination image.
#[derive(Debug)]
pub struct DirectBackend<'a> {
    rasterizer: &'a dyn Rasterizer,
    view: ImageView,
}

impl<'a> DirectBackend<'a> {
    /// Backend drawing into `view` (normally the surface's full view).
    pub fn new(rasterizer: &'a dyn Rasterizer, view: ImageView) -> Self {
        Self { rasterizer, view }
    }
}

impl ViewBackend for DirectBackend<'_> {
    fn rasterizer(&self) -> &dyn Rasterizer {
        self.rasterizer
    }

    fn target(&self) -> &ImageView {
        &self.view
    }
}

/// Executes entries on one tile's band view.
#[derive(Debug)]
pub struct TileBackend<'a> {
    rasterizer: &'a dyn Rasterizer,
    tile: &'a Tile,
}

impl<'a> TileBackend<'a> {
    /// Backend drawing into `tile`.
    pub fn new(rasterizer: &'a dyn Rasterizer, tile: &'a Tile) -> Self {
        Self { rasterizer, tile }
    }
}

impl ViewBackend for TileBackend<'_> {
    fn rasterizer(&self) -> &dyn Rasterizer {
        self.rasterizer
    }

    fn target(&self) -> &ImageView {
        &self.tile.view
    }
}

fn dispatch(entry: &Entry, clip: &Clip, backend: &dyn ReplayBackend) -> RasterResult<DrawStatus> {
    let op = entry.op;
    let source = &entry.source;
    match &entry.kind {
        EntryKind::Paint => backend.paint(op, source, clip),
        EntryKind::Mask { mask } => backend.mask(op, source, mask, clip),
        EntryKind::Fill(fill) => backend.fill(op, source, fill, clip),
        EntryKind::Stroke(stroke) => backend.stroke(op, source, stroke, clip),
        EntryKind::Glyphs(run) => backend.glyphs(op, source, run, clip),
    }
}

/// Walk `entries` in log order and execute them on `backend`.
///
/// With a `restrict` rectangle, entries whose extents miss it are skipped and the others have
/// their clip intersected with it. Returns the number of entries dispatched. Any backend error is
/// reported as [`RasterError::Replay`]; replay stops at the first one.
pub fn replay(
    entries: &JournalSnapshot,
    restrict: Option<IntRect>,
    backend: &dyn ReplayBackend,
) -> RasterResult<usize> {
    let mut dispatched = 0usize;
    for (idx, entry) in entries.iter().enumerate() {
        let clip = match restrict {
            Some(rect) => {
                if !entry.extents.intersects(rect) {
                    tracing::trace!(idx, kind = entry.kind.name(), "entry culled for tile");
                    continue;
                }
                Cow::Owned(entry.clip.intersect_rect(rect))
            }
            None => Cow::Borrowed(&entry.clip),
        };
        if let Err(err) = dispatch(entry, &clip, backend) {
            tracing::error!(idx, kind = entry.kind.name(), error = %err, "replay failed");
            return Err(RasterError::replay(format!(
                "{} entry {idx} failed: {err}",
                entry.kind.name()
            )));
        }
        dispatched += 1;
    }
    Ok(dispatched)
}

/// Everything a worker needs to replay one tile: a read-only entry snapshot and the rasterizer.
#[derive(Clone, Debug)]
pub struct ReplayJob {
    entries: JournalSnapshot,
    rasterizer: Arc<dyn Rasterizer>,
}

impl ReplayJob {
    /// Job replaying `entries` with `rasterizer`.
    pub fn new(entries: JournalSnapshot, rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            entries,
            rasterizer,
        }
    }

    /// Replay every entry touching `tile` into the tile's view.
    pub fn run_tile(&self, tile: &Tile) -> RasterResult<usize> {
        let backend = TileBackend::new(self.rasterizer.as_ref(), tile);
        let n = replay(&self.entries, Some(tile.rect), &backend)?;
        tracing::trace!(rect = ?tile.rect, entries = n, "tile replayed");
        Ok(n)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/replay.rs"]
mod tests;
