use kurbo::{BezPath, Point, Shape};
use smallvec::SmallVec;

use crate::foundation::core::IntRect;
use crate::paint::style::FillRule;

/// A path restricting drawing, combined with the rectangle region by intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPath {
    /// Device-space outline.
    pub path: BezPath,
    /// Inside test for the outline.
    pub rule: FillRule,
}

/// Region restricting which pixels an operation may affect.
///
/// A clip is the intersection of an optional union of device rectangles and zero or more clip
/// paths. A clip with neither is unbounded. Clips are plain values: cloning one deep-copies its
/// paths, so a logged clip is immune to later edits of the caller's copy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clip {
    rects: Option<SmallVec<[IntRect; 4]>>,
    paths: SmallVec<[ClipPath; 1]>,
}

impl Clip {
    /// Clip that restricts nothing.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Clip that excludes every pixel.
    pub fn all_clipped() -> Self {
        Self {
            rects: Some(SmallVec::new()),
            paths: SmallVec::new(),
        }
    }

    /// Clip to a single rectangle.
    pub fn from_rect(rect: IntRect) -> Self {
        Self::from_rects([rect])
    }

    /// Clip to the union of the given rectangles.
    pub fn from_rects(rects: impl IntoIterator<Item = IntRect>) -> Self {
        Self {
            rects: Some(rects.into_iter().filter(|r| !r.is_empty()).collect()),
            paths: SmallVec::new(),
        }
    }

    /// Return a copy further restricted to the inside of `path`.
    pub fn with_path(mut self, path: BezPath, rule: FillRule) -> Self {
        self.paths.push(ClipPath { path, rule });
        self
    }

    /// Rectangles of the region part, or `None` when only paths (or nothing) restrict.
    pub fn rects(&self) -> Option<&[IntRect]> {
        self.rects.as_deref()
    }

    /// Clip paths intersected with the region.
    pub fn paths(&self) -> &[ClipPath] {
        &self.paths
    }

    /// Return `true` when the clip restricts nothing.
    pub fn is_unbounded(&self) -> bool {
        self.rects.is_none() && self.paths.is_empty()
    }

    /// Return `true` when no pixel can pass the clip.
    pub fn is_all_clipped(&self) -> bool {
        self.extents().is_empty()
    }

    /// Intersection of this clip with a device rectangle.
    pub fn intersect_rect(&self, rect: IntRect) -> Self {
        let rects = match &self.rects {
            None if rect.is_empty() => SmallVec::new(),
            None => SmallVec::from_slice(&[rect]),
            Some(rs) => rs
                .iter()
                .map(|r| r.intersect(rect))
                .filter(|r| !r.is_empty())
                .collect(),
        };
        Self {
            rects: Some(rects),
            paths: self.paths.clone(),
        }
    }

    /// Conservative bounding rectangle of every pixel the clip lets through.
    pub fn extents(&self) -> IntRect {
        let mut extents = match &self.rects {
            None => IntRect::unbounded(),
            Some(rs) => rs
                .iter()
                .fold(IntRect::empty(), |acc, r| acc.union(*r)),
        };
        for p in &self.paths {
            extents = extents.intersect(IntRect::from_rect_outer(p.path.bounding_box()));
        }
        extents
    }

    /// Return `true` when the center of pixel `(x, y)` passes the clip.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        if let Some(rs) = &self.rects
            && !rs.iter().any(|r| r.contains(x, y))
        {
            return false;
        }
        if self.paths.is_empty() {
            return true;
        }
        let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        self.paths
            .iter()
            .all(|p| p.rule.is_inside(p.path.winding(center)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/paint/clip.rs"]
mod tests;
