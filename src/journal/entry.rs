use crate::foundation::core::IntRect;
use crate::paint::clip::Clip;
use crate::paint::glyph::GlyphRun;
use crate::paint::pattern::Pattern;
use crate::paint::shape::{FillParams, StrokeParams};
use crate::paint::style::Operator;

/// Operation-specific payload of a journal entry.
#[derive(Clone, Debug)]
pub enum EntryKind {
    /// Paint the source everywhere inside the clip.
    Paint,
    /// Paint the source through the alpha of a mask pattern.
    Mask {
        /// Coverage source.
        mask: Pattern,
    },
    /// Fill a path.
    Fill(FillParams),
    /// Stroke a path.
    Stroke(StrokeParams),
    /// Draw glyph outlines.
    Glyphs(GlyphRun),
}

impl EntryKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Paint => "paint",
            Self::Mask { .. } => "mask",
            Self::Fill(_) => "fill",
            Self::Stroke(_) => "stroke",
            Self::Glyphs(_) => "glyphs",
        }
    }
}

/// One recorded drawing operation.
///
/// Every field is an independent copy of what the caller passed, so the entry stays valid no
/// matter what the caller does with its own values afterwards.
#[derive(Clone, Debug)]
pub struct Entry {
    pub(crate) op: Operator,
    pub(crate) source: Pattern,
    pub(crate) clip: Clip,
    pub(crate) extents: IntRect,
    pub(crate) kind: EntryKind,
}

impl Entry {
    /// Compositing operator.
    pub fn op(&self) -> Operator {
        self.op
    }

    /// Snapshot of the paint source.
    pub fn source(&self) -> &Pattern {
        &self.source
    }

    /// Clip captured at log time.
    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    /// Conservative device rectangle the entry may modify.
    pub fn extents(&self) -> IntRect {
        self.extents
    }

    /// Operation payload.
    pub fn kind(&self) -> &EntryKind {
        &self.kind
    }
}
