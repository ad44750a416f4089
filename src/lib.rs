//! Deferred drawing for software 2D raster surfaces.
//!
//! Drawing calls on a [`Surface`] are recorded into a per-surface journal instead of being
//! rasterized right away. When pixels are needed the journal is replayed, either sequentially or
//! split into horizontal bands that are rasterized concurrently on a shared [`RenderPool`].
//!
//! - Create a [`Surface`] and optionally attach a [`RenderPool`]
//! - Issue `paint`/`mask`/`fill`/`stroke`/`show_glyphs` calls
//! - Read pixels back (or call [`Surface::flush`]) to replay the journal
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Journal of recorded drawing operations.
pub mod journal;
/// Drawing operation inputs.
pub mod paint;
/// Replay, rasterization and the worker pool.
pub mod render;
/// Destination images and the deferred surface.
pub mod surface;

pub use crate::foundation::core::{
    Affine, BezPath, IntRect, Point, Rect, Rgba8Premul, SurfaceId, Vec2,
};
pub use crate::foundation::error::{DrawStatus, RasterError, RasterResult};

pub use crate::journal::{Journal, JournalSnapshot};
pub use crate::paint::clip::Clip;
pub use crate::paint::glyph::{Glyph, GlyphRun, ScaledFont};
pub use crate::paint::pattern::{ImageData, Pattern, PatternSource, PendingDraws, SurfaceSource};
pub use crate::paint::shape::{FillParams, StrokeParams};
pub use crate::paint::style::{Antialias, FillRule, LineCap, LineJoin, Operator, StrokeStyle};
pub use crate::render::pool::{PoolOpts, PoolStrategy, RenderPool};
pub use crate::render::raster::{Rasterizer, SoftwareRasterizer};
pub use crate::render::signal::SyncMode;
pub use crate::surface::deferred::{FlushMode, FlushStats, Surface, SurfaceOpts};
pub use crate::surface::image::ImageSurface;
