//! Ordered, thread-guarded log of drawing operations.
//!
//! A [`Journal`] records value snapshots of drawing calls together with their conservative
//! extents and the running dirty rectangle. Replay reads a [`JournalSnapshot`]; logging,
//! flushing and clearing are serialized by the journal's mutex. Inputs are snapshotted before
//! the lock is taken, so snapshotting a live surface never nests two journal locks.

/// Chunked bulk-reset storage for journal entries.
pub mod arena;
/// The journal entry sum type.
pub mod entry;
/// Conservative extents estimation.
pub mod extents;

use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::core::IntRect;
use crate::foundation::error::{RasterError, RasterResult};
use crate::journal::arena::{Arena, DEFAULT_CHUNK_BYTES};
use crate::journal::entry::{Entry, EntryKind};
use crate::paint::clip::Clip;
use crate::paint::glyph::GlyphRun;
use crate::paint::pattern::Pattern;
use crate::paint::shape::{FillParams, StrokeParams};
use crate::paint::style::Operator;

#[derive(Debug)]
struct JournalState {
    entries: Arc<Arena<Entry>>,
    dirty: IntRect,
    chunk_bytes: usize,
}

impl JournalState {
    fn append(&mut self, entry: Entry) -> RasterResult<()> {
        let Some(arena) = Arc::get_mut(&mut self.entries) else {
            return Err(RasterError::unsupported(
                "journal is being replayed; cannot log",
            ));
        };
        let extents = entry.extents;
        let kind = entry.kind.name();
        arena.alloc(entry)?;
        self.dirty = self.dirty.union(extents);
        tracing::trace!(kind, ?extents, len = arena.len(), "journal entry logged");
        Ok(())
    }

    fn reset(&mut self) {
        self.dirty = IntRect::empty();
        match Arc::get_mut(&mut self.entries) {
            Some(arena) => arena.reset(),
            None => {
                // An outstanding snapshot keeps the old entries alive; they die with it.
                tracing::warn!("journal cleared while a replay snapshot is outstanding");
                self.entries = Arc::new(Arena::new(self.chunk_bytes));
            }
        }
    }
}

/// The deferred-operation log of one surface.
#[derive(Debug)]
pub struct Journal {
    state: Mutex<JournalState>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_BYTES)
    }
}

impl Journal {
    /// Empty journal whose arena uses chunks of about `chunk_bytes`.
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            state: Mutex::new(JournalState {
                entries: Arc::new(Arena::new(chunk_bytes)),
                dirty: IntRect::empty(),
                chunk_bytes,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JournalState> {
        // A panic while holding the lock leaves the entry list consistent: entries are only
        // appended after being fully built.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a paint of `source` through `clip`.
    pub fn log_paint(&self, op: Operator, source: &Pattern, clip: &Clip) -> RasterResult<()> {
        let source = source.snapshot()?;
        let clip = clip.clone();
        let extents = extents::paint_extents(op, &source, &clip);
        self.lock().append(Entry {
            op,
            source,
            clip,
            extents,
            kind: EntryKind::Paint,
        })
    }

    /// Record a paint of `source` through the alpha of `mask`.
    pub fn log_mask(
        &self,
        op: Operator,
        source: &Pattern,
        mask: &Pattern,
        clip: &Clip,
    ) -> RasterResult<()> {
        let source = source.snapshot()?;
        let mask = mask.snapshot()?;
        let clip = clip.clone();
        let extents = extents::mask_extents(op, &source, &mask, &clip);
        self.lock().append(Entry {
            op,
            source,
            clip,
            extents,
            kind: EntryKind::Mask { mask },
        })
    }

    /// Record a path fill.
    pub fn log_fill(
        &self,
        op: Operator,
        source: &Pattern,
        fill: &FillParams,
        clip: &Clip,
    ) -> RasterResult<()> {
        let source = source.snapshot()?;
        let fill = fill.clone();
        let clip = clip.clone();
        let extents = extents::fill_extents(op, &source, &fill, &clip);
        self.lock().append(Entry {
            op,
            source,
            clip,
            extents,
            kind: EntryKind::Fill(fill),
        })
    }

    /// Record a path stroke.
    pub fn log_stroke(
        &self,
        op: Operator,
        source: &Pattern,
        stroke: &StrokeParams,
        clip: &Clip,
    ) -> RasterResult<()> {
        let source = source.snapshot()?;
        let stroke = stroke.clone();
        let clip = clip.clone();
        let extents = extents::stroke_extents(op, &source, &stroke, &clip);
        self.lock().append(Entry {
            op,
            source,
            clip,
            extents,
            kind: EntryKind::Stroke(stroke),
        })
    }

    /// Record a glyph run.
    pub fn log_glyphs(
        &self,
        op: Operator,
        source: &Pattern,
        run: &GlyphRun,
        clip: &Clip,
    ) -> RasterResult<()> {
        let source = source.snapshot()?;
        let run = run.try_clone()?;
        let clip = clip.clone();
        let extents = extents::glyphs_extents(op, &source, &run, &clip);
        self.lock().append(Entry {
            op,
            source,
            clip,
            extents,
            kind: EntryKind::Glyphs(run),
        })
    }

    /// Destroy every entry in log order, reset the arena and empty the dirty rectangle.
    ///
    /// Clearing an empty journal is a no-op.
    pub fn clear(&self) {
        self.lock().reset();
    }

    /// Hand the current entries and dirty rectangle to `replay`, then clear the journal.
    ///
    /// The journal stays locked until it is cleared, so concurrent flushes of the same journal
    /// replay every entry exactly once and logging waits for the replay to finish. `replay` must
    /// not call back into this journal. Returns `None` without calling `replay` when the journal
    /// is empty.
    pub fn flush_with<R>(&self, replay: impl FnOnce(&JournalSnapshot, IntRect) -> R) -> Option<R> {
        let mut state = self.lock();
        if state.entries.is_empty() {
            return None;
        }
        let snapshot = JournalSnapshot {
            entries: state.entries.clone(),
        };
        let result = replay(&snapshot, state.dirty);
        drop(snapshot);
        state.reset();
        Some(result)
    }

    /// Number of logged entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Return `true` when nothing is logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Union of the extents of every logged entry.
    pub fn dirty_extents(&self) -> IntRect {
        self.lock().dirty
    }

    /// Chunks currently held by the entry arena.
    pub fn chunk_count(&self) -> usize {
        self.lock().entries.chunk_count()
    }

    /// Read-only handle on the current entries for replay.
    ///
    /// While a snapshot is alive, logging returns `Unsupported`.
    pub fn snapshot(&self) -> JournalSnapshot {
        JournalSnapshot {
            entries: self.lock().entries.clone(),
        }
    }
}

/// Shared read-only view of a journal's entries, in log order.
#[derive(Clone, Debug)]
pub struct JournalSnapshot {
    entries: Arc<Arena<Entry>>,
}

impl JournalSnapshot {
    /// Entries in log order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/journal/journal.rs"]
mod tests;
