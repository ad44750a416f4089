use kurbo::{Affine, Cap, Join, Stroke};
use smallvec::SmallVec;

/// Compositing operator applied when an operation writes to the destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Clear the destination under the shape.
    Clear,
    /// Replace the destination with the source.
    Source,
    /// Source over destination.
    #[default]
    Over,
    /// Source where the destination is, nothing elsewhere.
    In,
    /// Source where the destination is not, nothing elsewhere.
    Out,
    /// Source over destination, only where the destination is.
    Atop,
    /// Leave the destination unchanged.
    Dest,
    /// Destination over source.
    DestOver,
    /// Destination where the source is.
    DestIn,
    /// Destination where the source is not.
    DestOut,
    /// Destination over source, only where the source is.
    DestAtop,
    /// Source and destination where they do not overlap.
    Xor,
    /// Saturating sum of source and destination.
    Add,
}

impl Operator {
    /// Whether pixels outside the operation's coverage mask stay untouched.
    ///
    /// Unbounded operators (`In`, `Out`, `DestIn`, `DestAtop`) modify every pixel inside the clip,
    /// so their extents cannot be narrowed to the shape.
    pub fn is_bounded_by_mask(self) -> bool {
        !matches!(self, Self::In | Self::Out | Self::DestIn | Self::DestAtop)
    }

    /// Whether pixels outside the source's own extents stay untouched.
    pub fn is_bounded_by_source(self) -> bool {
        !matches!(
            self,
            Self::Clear | Self::Source | Self::In | Self::Out | Self::DestIn | Self::DestAtop
        )
    }
}

/// Rule deciding which points are inside a self-intersecting path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Non-zero winding number.
    #[default]
    Winding,
    /// Odd winding number.
    EvenOdd,
}

impl FillRule {
    /// Apply the rule to a winding number.
    pub fn is_inside(self, winding: i32) -> bool {
        match self {
            Self::Winding => winding != 0,
            Self::EvenOdd => winding % 2 != 0,
        }
    }
}

/// Antialiasing quality requested for shape coverage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Antialias {
    /// Backend default (grayscale supersampling).
    #[default]
    Default,
    /// Single sample at the pixel center.
    None,
    /// Grayscale supersampling.
    Gray,
    /// Cheapest antialiasing the backend offers.
    Fast,
    /// Balanced quality.
    Good,
    /// Highest quality the backend offers.
    Best,
}

impl Antialias {
    /// Samples per pixel axis used by the reference rasterizer.
    pub(crate) fn samples_per_axis(self) -> u32 {
        match self {
            Self::None => 1,
            Self::Fast => 2,
            Self::Default | Self::Gray | Self::Good => 4,
            Self::Best => 8,
        }
    }
}

/// Shape drawn at the open ends of stroked subpaths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
    /// Stop exactly at the endpoint.
    #[default]
    Butt,
    /// Half-disc centered on the endpoint.
    Round,
    /// Half-square extending past the endpoint.
    Square,
}

/// Shape drawn where two stroked segments meet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineJoin {
    /// Sharp corner, limited by the miter limit.
    #[default]
    Miter,
    /// Rounded corner.
    Round,
    /// Cut-off corner.
    Bevel,
}

/// Stroke parameters, owned by value so a logged stroke never observes later edits.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Line width in user space.
    pub width: f64,
    /// End cap.
    pub cap: LineCap,
    /// Corner join.
    pub join: LineJoin,
    /// Ratio limit for miter joins.
    pub miter_limit: f64,
    /// Alternating on/off dash lengths; empty means solid.
    pub dashes: SmallVec<[f64; 4]>,
    /// Offset into the dash pattern at the start of each subpath.
    pub dash_offset: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dashes: SmallVec::new(),
            dash_offset: 0.0,
        }
    }
}

impl StrokeStyle {
    /// Solid stroke of the given width.
    pub fn new(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Return a copy with the given cap.
    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    /// Return a copy with the given join.
    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    /// Return a copy with the given dash pattern.
    pub fn with_dashes(mut self, offset: f64, dashes: &[f64]) -> Self {
        self.dash_offset = offset;
        self.dashes = dashes.iter().copied().collect();
        self
    }

    /// Conservative device-space distance a stroke can reach away from its path.
    ///
    /// Returned as `(dx, dy)` so anisotropic transforms stay tight on each axis.
    pub fn max_device_distance(&self, ctm: Affine) -> (f64, f64) {
        let mut expansion: f64 = 0.5;
        if self.cap == LineCap::Square {
            expansion = std::f64::consts::FRAC_1_SQRT_2;
        }
        if self.join == LineJoin::Miter && expansion < std::f64::consts::SQRT_2 * self.miter_limit
        {
            expansion = std::f64::consts::SQRT_2 * self.miter_limit;
        }
        expansion *= self.width.abs();

        let [xx, yx, xy, yy, _, _] = ctm.as_coeffs();
        (expansion * xx.hypot(xy), expansion * yy.hypot(yx))
    }

    pub(crate) fn to_kurbo(&self) -> Stroke {
        let cap = match self.cap {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        };
        let join = match self.join {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        };
        Stroke::new(self.width)
            .with_caps(cap)
            .with_join(join)
            .with_miter_limit(self.miter_limit)
            .with_dashes(self.dash_offset, self.dashes.iter().copied())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/paint/style.rs"]
mod tests;
