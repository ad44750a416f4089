//! Parallel replay of journals: band partitioning, the worker pool, the replay dispatcher and
//! the reference rasterizer.

/// Porter-Duff compositing on premultiplied pixels.
pub mod composite;
/// Worker pool and scheduling strategies.
pub mod pool;
/// Rasterizer contract and the software reference implementation.
pub mod raster;
/// Journal replay dispatcher and execution backends.
pub mod replay;
/// Wake and completion signals.
pub mod signal;
/// Band partitioning of dirty rectangles.
pub mod tile;
