use std::borrow::Cow;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::core::{IntRect, Rgba8Premul, SurfaceId};
use crate::foundation::error::{DrawStatus, RasterError, RasterResult};
use crate::journal::arena::DEFAULT_CHUNK_BYTES;
use crate::journal::{Journal, JournalSnapshot};
use crate::paint::clip::Clip;
use crate::paint::glyph::GlyphRun;
use crate::paint::pattern::{Pattern, PendingDraws, SurfaceSource};
use crate::paint::shape::{FillParams, StrokeParams};
use crate::paint::style::Operator;
use crate::render::pool::RenderPool;
use crate::render::raster::{Rasterizer, SoftwareRasterizer};
use crate::render::replay::{DirectBackend, ReplayJob, replay};
use crate::render::tile::{self, MAX_TILES};
use crate::surface::image::ImageSurface;

/// Surface behavior knobs.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SurfaceOpts {
    /// Log drawing calls instead of executing them immediately.
    pub deferred: bool,
    /// Journals with fewer entries are always replayed sequentially.
    pub min_parallel_entries: usize,
    /// Upper bound on bands per flush, clamped to `[1, MAX_TILES]`.
    pub max_tiles: usize,
    /// Approximate size of one journal arena chunk.
    pub arena_chunk_bytes: usize,
}

impl Default for SurfaceOpts {
    fn default() -> Self {
        Self {
            deferred: true,
            min_parallel_entries: 8,
            max_tiles: MAX_TILES,
            arena_chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }
}

impl SurfaceOpts {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> RasterResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RasterError::validation(format!("invalid surface options: {e}")))
    }

    /// Return a copy with deferral switched on or off.
    pub fn with_deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    /// Return a copy with the given parallel threshold.
    pub fn with_min_parallel_entries(mut self, n: usize) -> Self {
        self.min_parallel_entries = n;
        self
    }

    /// Return a copy with the given band limit.
    pub fn with_max_tiles(mut self, n: usize) -> Self {
        self.max_tiles = n;
        self
    }

    /// Return a copy with the given arena chunk size.
    pub fn with_arena_chunk_bytes(mut self, bytes: usize) -> Self {
        self.arena_chunk_bytes = bytes;
        self
    }
}

/// How a flush executed the journal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushMode {
    /// Nothing to replay.
    Idle,
    /// One pass over the whole image on the calling thread.
    Sequential,
    /// Bands replayed on the render pool.
    Parallel,
}

/// Outcome of [`Surface::flush`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushStats {
    /// Entries that were in the journal.
    pub entries: usize,
    /// Bands replayed in parallel; zero unless `mode` is [`FlushMode::Parallel`].
    pub tiles: usize,
    /// Execution mode.
    pub mode: FlushMode,
}

impl FlushStats {
    fn idle(entries: usize) -> Self {
        Self {
            entries,
            tiles: 0,
            mode: FlushMode::Idle,
        }
    }
}

enum DrawCall<'a> {
    Paint,
    Mask(&'a Pattern),
    Fill(&'a FillParams),
    Stroke(&'a StrokeParams),
    Glyphs(&'a GlyphRun),
}

impl DrawCall<'_> {
    fn mask(&self) -> Option<&Pattern> {
        match self {
            Self::Mask(mask) => Some(*mask),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Backend {
    pool: Option<Arc<RenderPool>>,
    rasterizer: Arc<dyn Rasterizer>,
}

/// State shared between a surface and the sources viewing it.
#[derive(Debug)]
struct SurfaceCore {
    id: SurfaceId,
    image: ImageSurface,
    journal: Journal,
    backend: Mutex<Backend>,
    opts: SurfaceOpts,
}

impl SurfaceCore {
    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[tracing::instrument(level = "debug", skip(self), fields(surface = self.id.0))]
    fn flush(&self) -> RasterResult<FlushStats> {
        self.journal
            .flush_with(|snapshot, dirty| self.replay_journal(snapshot, dirty))
            .unwrap_or(Ok(FlushStats::idle(0)))
    }

    fn replay_journal(&self, snapshot: &JournalSnapshot, dirty: IntRect) -> RasterResult<FlushStats> {
        let entries = snapshot.len();
        if !dirty.intersects(self.image.bounds()) {
            tracing::debug!(entries, "journal lies outside the surface; discarding");
            return Ok(FlushStats::idle(entries));
        }
        self.image.begin_modification()?;
        let (pool, rasterizer) = {
            let backend = self.backend();
            (backend.pool.clone(), backend.rasterizer.clone())
        };

        match self.replay_parallel(pool.as_deref(), &rasterizer, snapshot, dirty) {
            Ok(tiles) => {
                tracing::debug!(entries, tiles, "parallel flush");
                return Ok(FlushStats {
                    entries,
                    tiles,
                    mode: FlushMode::Parallel,
                });
            }
            Err(e) if e.is_fallback() => {
                tracing::debug!(entries, reason = %e, "sequential flush");
            }
            Err(e) => return Err(e),
        }

        let backend = DirectBackend::new(rasterizer.as_ref(), self.image.full_view());
        replay(snapshot, None, &backend)?;
        Ok(FlushStats {
            entries,
            tiles: 0,
            mode: FlushMode::Sequential,
        })
    }

    fn replay_parallel(
        &self,
        pool: Option<&RenderPool>,
        rasterizer: &Arc<dyn Rasterizer>,
        snapshot: &JournalSnapshot,
        dirty: IntRect,
    ) -> RasterResult<usize> {
        let Some(pool) = pool else {
            return Err(RasterError::unsupported("no render pool attached"));
        };
        if snapshot.len() < self.opts.min_parallel_entries {
            return Err(RasterError::unsupported(format!(
                "{} entries below parallel threshold {}",
                snapshot.len(),
                self.opts.min_parallel_entries
            )));
        }
        let workers = pool
            .max_parallelism()
            .min(self.opts.max_tiles.clamp(1, MAX_TILES));
        let tiles = tile::partition(&self.image, dirty, workers)?;
        if tiles.is_empty() {
            return Err(RasterError::unsupported("no tiles to replay"));
        }
        let job = ReplayJob::new(snapshot.clone(), rasterizer.clone());
        pool.run(&tiles, &job)?;
        Ok(tiles.len())
    }
}

impl PendingDraws for SurfaceCore {
    fn flush_pending(&self) -> RasterResult<()> {
        self.flush().map(|_| ())
    }
}

/// A drawable raster surface with deferred execution.
///
/// Drawing calls are recorded into a [`Journal`] and replayed when pixels are needed: on an
/// explicit [`Surface::flush`], before every read-back, before any call that has to run
/// immediately, and whenever another surface snapshots this one through a source returned by
/// [`Surface::as_source`] or [`Surface::sub_surface`]. Replay is spread over horizontal bands on
/// the attached [`RenderPool`] when the journal is large enough, and runs sequentially otherwise.
///
/// Calls whose source or mask reads this very surface (directly or through sub-surface views),
/// or whose content is generated lazily, are never recorded; they flush and execute at once.
#[derive(Debug)]
pub struct Surface {
    core: Arc<SurfaceCore>,
}

impl Surface {
    /// Transparent surface with default options and no render pool.
    pub fn new(width: u32, height: u32) -> RasterResult<Self> {
        Self::with_opts(width, height, SurfaceOpts::default())
    }

    /// Transparent surface with the given options and no render pool.
    pub fn with_opts(width: u32, height: u32, opts: SurfaceOpts) -> RasterResult<Self> {
        let core = SurfaceCore {
            id: SurfaceId::next(),
            image: ImageSurface::new(width, height)?,
            journal: Journal::new(opts.arena_chunk_bytes),
            backend: Mutex::new(Backend {
                pool: None,
                rasterizer: Arc::new(SoftwareRasterizer::new()),
            }),
            opts,
        };
        Ok(Self {
            core: Arc::new(core),
        })
    }

    /// Return a surface that replays large journals on `pool`.
    pub fn with_pool(self, pool: Arc<RenderPool>) -> Self {
        self.core.backend().pool = Some(pool);
        self
    }

    /// Return a surface drawing through `rasterizer`.
    ///
    /// Pending entries are not flushed; they will be replayed with the new rasterizer.
    pub fn with_rasterizer(self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.core.backend().rasterizer = rasterizer;
        self
    }

    /// Process-unique identity.
    pub fn id(&self) -> SurfaceId {
        self.core.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.core.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.core.image.height()
    }

    /// Options in effect.
    pub fn opts(&self) -> &SurfaceOpts {
        &self.core.opts
    }

    /// Attached render pool, if any.
    pub fn pool(&self) -> Option<Arc<RenderPool>> {
        self.core.backend().pool.clone()
    }

    /// Backing image. Its pixels do not include pending journal entries.
    pub fn image(&self) -> &ImageSurface {
        &self.core.image
    }

    /// The surface's journal.
    pub fn journal(&self) -> &Journal {
        &self.core.journal
    }

    /// Number of recorded, not yet replayed entries.
    pub fn pending_entries(&self) -> usize {
        self.core.journal.len()
    }

    /// Union of the extents of every pending entry.
    pub fn dirty_extents(&self) -> IntRect {
        self.core.journal.dirty_extents()
    }

    /// Paint `source` everywhere inside `clip`.
    pub fn paint(&mut self, op: Operator, source: &Pattern, clip: &Clip) -> RasterResult<DrawStatus> {
        self.draw(DrawCall::Paint, op, source, clip)
    }

    /// Paint `source` through the alpha of `mask`.
    pub fn mask(
        &mut self,
        op: Operator,
        source: &Pattern,
        mask: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.draw(DrawCall::Mask(mask), op, source, clip)
    }

    /// Fill a path.
    pub fn fill(
        &mut self,
        op: Operator,
        source: &Pattern,
        fill: &FillParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.draw(DrawCall::Fill(fill), op, source, clip)
    }

    /// Stroke a path.
    pub fn stroke(
        &mut self,
        op: Operator,
        source: &Pattern,
        stroke: &StrokeParams,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.draw(DrawCall::Stroke(stroke), op, source, clip)
    }

    /// Draw a glyph run.
    pub fn show_glyphs(
        &mut self,
        op: Operator,
        source: &Pattern,
        run: &GlyphRun,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        self.draw(DrawCall::Glyphs(run), op, source, clip)
    }

    fn draw(
        &mut self,
        call: DrawCall<'_>,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        if self.core.image.is_finished() {
            return Err(RasterError::Finished);
        }
        if clip.is_all_clipped() {
            return Ok(DrawStatus::NothingToDo);
        }

        if self.core.opts.deferred {
            match self.immediate_reason(&call, source) {
                Some(reason) => tracing::trace!(reason, "executing immediately"),
                None => match self.log(&call, op, source, clip) {
                    Ok(()) => return Ok(DrawStatus::Drawn),
                    Err(e) if e.is_fallback() => {
                        tracing::debug!(error = %e, "logging declined; executing immediately")
                    }
                    Err(e) => return Err(e),
                },
            }
        }

        // Surfaces read live below must include their own pending draws.
        for pattern in std::iter::once(source).chain(call.mask()) {
            pattern.flush_sources()?;
        }
        self.flush()?;
        self.core.image.begin_modification()?;
        self.execute(&call, op, source, clip)
    }

    fn immediate_reason(&self, call: &DrawCall<'_>, source: &Pattern) -> Option<&'static str> {
        for pattern in std::iter::once(source).chain(call.mask()) {
            if pattern.reads_from(self.core.id) {
                return Some("pattern reads from the destination surface");
            }
            if pattern.is_recording() {
                return Some("recording pattern cannot be snapshotted");
            }
        }
        None
    }

    fn log(
        &self,
        call: &DrawCall<'_>,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
    ) -> RasterResult<()> {
        let journal = &self.core.journal;
        match call {
            DrawCall::Paint => journal.log_paint(op, source, clip),
            DrawCall::Mask(mask) => journal.log_mask(op, source, mask, clip),
            DrawCall::Fill(fill) => journal.log_fill(op, source, fill, clip),
            DrawCall::Stroke(stroke) => journal.log_stroke(op, source, stroke, clip),
            DrawCall::Glyphs(run) => journal.log_glyphs(op, source, run, clip),
        }
    }

    fn execute(
        &self,
        call: &DrawCall<'_>,
        op: Operator,
        source: &Pattern,
        clip: &Clip,
    ) -> RasterResult<DrawStatus> {
        // Reading and writing the same pixels within one call needs a stable copy of the source.
        let source = self.detached(source)?;
        let mask = call.mask().map(|m| self.detached(m)).transpose()?;
        let view = self.core.image.full_view();
        let rasterizer = self.core.backend().rasterizer.clone();
        let r = rasterizer.as_ref();
        match call {
            DrawCall::Paint => r.paint(&view, op, &source, clip),
            DrawCall::Mask(_) => match mask {
                Some(mask) => r.mask(&view, op, &source, &mask, clip),
                None => Ok(DrawStatus::NothingToDo),
            },
            DrawCall::Fill(fill) => r.fill(&view, op, &source, fill, clip),
            DrawCall::Stroke(stroke) => r.stroke(&view, op, &source, stroke, clip),
            DrawCall::Glyphs(run) => r.glyphs(&view, op, &source, run, clip),
        }
    }

    fn detached<'p>(&self, pattern: &'p Pattern) -> RasterResult<Cow<'p, Pattern>> {
        if pattern.reads_from(self.core.id) {
            Ok(Cow::Owned(pattern.snapshot()?))
        } else {
            Ok(Cow::Borrowed(pattern))
        }
    }

    /// Replay and clear the journal.
    ///
    /// Flushing an empty journal does nothing. The journal is cleared even when replay fails;
    /// a replay failure is returned as [`RasterError::Replay`].
    pub fn flush(&mut self) -> RasterResult<FlushStats> {
        self.core.flush()
    }

    /// Flush, then copy out premultiplied RGBA8 bytes.
    pub fn to_rgba8(&mut self) -> RasterResult<Vec<u8>> {
        self.flush()?;
        Ok(self.core.image.to_rgba8())
    }

    /// Flush, then read one pixel; transparent outside the surface.
    pub fn pixel(&mut self, x: i32, y: i32) -> RasterResult<Rgba8Premul> {
        self.flush()?;
        Ok(self.core.image.pixels().load(x, y))
    }

    /// Flush, then return a live view of this surface usable as a pattern source.
    ///
    /// Sampling the view reads the pixels as they are. Snapshotting it, which happens whenever
    /// another surface records or executes a draw from it, flushes this surface first.
    pub fn as_source(&mut self) -> RasterResult<Arc<SurfaceSource>> {
        self.flush()?;
        let pending: Arc<dyn PendingDraws> = self.core.clone();
        Ok(Arc::new(SurfaceSource::Image {
            id: self.core.id,
            pixels: self.core.image.pixels().clone(),
            pending: Some(pending),
        }))
    }

    /// Flush, then return a live view of `rect`, re-based at the origin.
    pub fn sub_surface(&mut self, rect: IntRect) -> RasterResult<Arc<SurfaceSource>> {
        let bounds = self.core.image.bounds();
        if rect.is_empty() || !bounds.contains_rect(rect) {
            return Err(RasterError::validation(format!(
                "sub surface {rect:?} is not inside surface bounds {bounds:?}"
            )));
        }
        Ok(Arc::new(SurfaceSource::SubSurface {
            parent: self.as_source()?,
            extents: rect,
        }))
    }

    /// Flush, then encode the pixels as PNG at `path`.
    pub fn write_png(&mut self, path: impl AsRef<Path>) -> RasterResult<()> {
        self.flush()?;
        self.core.image.write_png(path)
    }

    /// Flush and make the surface read-only. Later drawing calls fail with
    /// [`RasterError::Finished`].
    pub fn finish(&mut self) -> RasterResult<FlushStats> {
        let stats = self.flush()?;
        self.core.image.finish();
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/surface/deferred.rs"]
mod tests;
