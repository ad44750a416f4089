//! Destination images and the deferred drawing surface built on top of them.

/// The deferred drawing surface.
pub mod deferred;
/// Shared pixel storage, destination image and sub-views.
pub mod image;
