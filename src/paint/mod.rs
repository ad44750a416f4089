//! Value types handed to drawing operations: patterns, clips, styles and glyphs.
//!
//! All of them have value semantics so that a logged operation can own an independent copy.

/// Clip regions.
pub mod clip;
/// Positioned glyphs and scaled fonts.
pub mod glyph;
/// Paint sources.
pub mod pattern;
/// Fill and stroke parameters.
pub mod shape;
/// Operators, fill rules, antialias modes and stroke styles.
pub mod style;
