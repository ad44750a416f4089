use kurbo::{Affine, BezPath};

use crate::paint::style::{Antialias, FillRule, StrokeStyle};

/// Parameters of a fill operation. The path is in device space.
#[derive(Clone, Debug, PartialEq)]
pub struct FillParams {
    /// Device-space outline.
    pub path: BezPath,
    /// Inside test.
    pub rule: FillRule,
    /// Maximum flattening error in device pixels.
    pub tolerance: f64,
    /// Coverage quality.
    pub antialias: Antialias,
}

impl FillParams {
    /// Non-zero fill of `path` with default tolerance and antialiasing.
    pub fn new(path: BezPath) -> Self {
        Self {
            path,
            rule: FillRule::Winding,
            tolerance: 0.1,
            antialias: Antialias::Default,
        }
    }

    /// Return a copy with the given fill rule.
    pub fn with_rule(mut self, rule: FillRule) -> Self {
        self.rule = rule;
        self
    }

    /// Return a copy with the given antialias mode.
    pub fn with_antialias(mut self, antialias: Antialias) -> Self {
        self.antialias = antialias;
        self
    }
}

/// Parameters of a stroke operation.
///
/// The path is in device space; `ctm` maps user space (where the pen lives) to device space and
/// `ctm_inverse` maps back.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeParams {
    /// Device-space centerline.
    pub path: BezPath,
    /// Pen description in user space.
    pub style: StrokeStyle,
    /// User to device transform.
    pub ctm: Affine,
    /// Device to user transform.
    pub ctm_inverse: Affine,
    /// Maximum flattening error in device pixels.
    pub tolerance: f64,
    /// Coverage quality.
    pub antialias: Antialias,
}

impl StrokeParams {
    /// Stroke `path` with `style` under an identity transform.
    pub fn new(path: BezPath, style: StrokeStyle) -> Self {
        Self {
            path,
            style,
            ctm: Affine::IDENTITY,
            ctm_inverse: Affine::IDENTITY,
            tolerance: 0.1,
            antialias: Antialias::Default,
        }
    }

    /// Return a copy using `ctm` (and its inverse) for the pen.
    pub fn with_ctm(mut self, ctm: Affine) -> Self {
        self.ctm = ctm;
        self.ctm_inverse = ctm.inverse();
        self
    }

    /// Return a copy with the given antialias mode.
    pub fn with_antialias(mut self, antialias: Antialias) -> Self {
        self.antialias = antialias;
        self
    }
}
