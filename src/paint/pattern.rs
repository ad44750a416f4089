use std::fmt::Debug;
use std::sync::Arc;

use kurbo::Point;
use smallvec::SmallVec;

use crate::foundation::core::{IntRect, Rgba8Premul, SurfaceId};
use crate::foundation::error::{RasterError, RasterResult};
use crate::foundation::math::lerp_u8;
use crate::surface::image::PixelStorage;

/// Immutable premultiplied pixels, shared by every pattern that samples them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<Rgba8Premul>,
}

impl ImageData {
    /// Wrap `width * height` row-major pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba8Premul>) -> RasterResult<Self> {
        let expected = (width as usize).checked_mul(height as usize);
        if expected != Some(pixels.len()) {
            return Err(RasterError::validation(format!(
                "image data expects {width}x{height} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image filled with a single color.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> RasterResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RasterError::NoMemory)?;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, color);
        Self::new(width, height, pixels)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`, transparent outside the image.
    pub fn get(&self, x: i32, y: i32) -> Rgba8Premul {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Rgba8Premul::transparent();
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    fn copy_region(source: &SurfaceSource, rect: IntRect) -> RasterResult<Self> {
        let width = rect.width.max(0) as u32;
        let height = rect.height.max(0) as u32;
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RasterError::NoMemory)?;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        for y in 0..rect.height.max(0) {
            for x in 0..rect.width.max(0) {
                pixels.push(source.sample(rect.x + x, rect.y + y));
            }
        }
        Self::new(width, height, pixels)
    }
}

/// An image placed at an integer device offset. Sampling outside the image yields transparent.
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePattern {
    /// Pixels.
    pub image: Arc<ImageData>,
    /// Device position of the image's top-left pixel.
    pub origin: (i32, i32),
}

impl ImagePattern {
    /// Place `image` with its top-left pixel at `origin`.
    pub fn new(image: Arc<ImageData>, origin: (i32, i32)) -> Self {
        Self { image, origin }
    }

    fn extents(&self) -> IntRect {
        IntRect::new(
            self.origin.0,
            self.origin.1,
            self.image.width() as i32,
            self.image.height() as i32,
        )
    }
}

/// A color stop of a gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient axis in `[0, 1]`.
    pub offset: f64,
    /// Color at that position.
    pub color: Rgba8Premul,
}

/// Linear gradient between two device points, padded beyond its ends.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearGradient {
    /// Point mapped to offset 0.
    pub start: Point,
    /// Point mapped to offset 1.
    pub end: Point,
    /// Stops in increasing offset order.
    pub stops: SmallVec<[GradientStop; 4]>,
}

impl LinearGradient {
    /// Two-stop gradient.
    pub fn new(start: Point, end: Point, from: Rgba8Premul, to: Rgba8Premul) -> Self {
        let stops = SmallVec::from_slice(&[
            GradientStop {
                offset: 0.0,
                color: from,
            },
            GradientStop {
                offset: 1.0,
                color: to,
            },
        ]);
        Self { start, end, stops }
    }

    fn sample(&self, x: i32, y: i32) -> Rgba8Premul {
        let Some(first) = self.stops.first() else {
            return Rgba8Premul::transparent();
        };
        let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
        let axis = self.end - self.start;
        let len2 = axis.hypot2();
        let t = if len2 > 0.0 {
            ((p - self.start).dot(axis) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let mut prev = *first;
        if t <= prev.offset {
            return prev.color;
        }
        for stop in self.stops.iter().skip(1) {
            if t <= stop.offset {
                let span = stop.offset - prev.offset;
                let f = if span > 0.0 {
                    (t - prev.offset) / span
                } else {
                    1.0
                };
                let w = (f * 255.0).round().clamp(0.0, 255.0) as u8;
                let a = prev.color.to_array();
                let b = stop.color.to_array();
                return Rgba8Premul::from_array(std::array::from_fn(|i| lerp_u8(a[i], b[i], w)));
            }
            prev = *stop;
        }
        prev.color
    }
}

/// Drawing work recorded against a pixel source but not yet applied to its pixels.
pub trait PendingDraws: Debug + Send + Sync {
    /// Apply every recorded draw so the source's pixels are current.
    fn flush_pending(&self) -> RasterResult<()>;
}

/// Live pixel source backed by a surface, or by a sub-surface view chained onto one.
#[derive(Clone, Debug)]
pub enum SurfaceSource {
    /// The full pixel storage of a surface.
    Image {
        /// Owning surface.
        id: SurfaceId,
        /// Shared pixel storage.
        pixels: Arc<PixelStorage>,
        /// Deferred draws targeting `pixels`, flushed before the pixels are copied.
        pending: Option<Arc<dyn PendingDraws>>,
    },
    /// A rectangle of another source, re-based at the origin.
    SubSurface {
        /// Viewed source.
        parent: Arc<SurfaceSource>,
        /// Viewed rectangle in the parent's coordinates.
        extents: IntRect,
    },
}

impl SurfaceSource {
    /// The surface at the root of the view chain.
    pub fn root_id(&self) -> SurfaceId {
        let mut cur = self;
        loop {
            match cur {
                Self::Image { id, .. } => return *id,
                Self::SubSurface { parent, .. } => cur = parent,
            }
        }
    }

    /// Bring the root pixels up to date by flushing the owning surface's pending draws.
    pub fn flush_pending(&self) -> RasterResult<()> {
        let mut cur = self;
        loop {
            match cur {
                Self::Image { pending, .. } => {
                    return pending.as_ref().map_or(Ok(()), |p| p.flush_pending());
                }
                Self::SubSurface { parent, .. } => cur = parent,
            }
        }
    }

    /// Source-space bounds.
    pub fn extents(&self) -> IntRect {
        match self {
            Self::Image { pixels, .. } => {
                IntRect::from_size(pixels.width() as i32, pixels.height() as i32)
            }
            Self::SubSurface { extents, .. } => IntRect::from_size(extents.width, extents.height),
        }
    }

    /// Pixel at source coordinates `(x, y)`, transparent outside.
    pub fn sample(&self, x: i32, y: i32) -> Rgba8Premul {
        match self {
            Self::Image { pixels, .. } => pixels.load(x, y),
            Self::SubSurface { parent, extents } => {
                if !IntRect::from_size(extents.width, extents.height).contains(x, y) {
                    return Rgba8Premul::transparent();
                }
                parent.sample(x + extents.x, y + extents.y)
            }
        }
    }
}

/// A surface (or sub-surface view) placed at an integer device offset.
#[derive(Clone, Debug)]
pub struct SurfacePattern {
    /// Viewed source.
    pub source: Arc<SurfaceSource>,
    /// Device position of the source's origin.
    pub origin: (i32, i32),
}

impl SurfacePattern {
    fn extents(&self) -> IntRect {
        let e = self.source.extents();
        IntRect::new(e.x + self.origin.0, e.y + self.origin.1, e.width, e.height)
    }
}

/// Content generated on demand instead of being stored.
pub trait PatternSource: Debug + Send + Sync {
    /// Color at device pixel `(x, y)`.
    fn sample(&self, x: i32, y: i32) -> Rgba8Premul;

    /// Bounds of the non-transparent content, if known.
    fn extents(&self) -> Option<IntRect> {
        None
    }
}

/// Pattern whose content is produced lazily and therefore cannot be snapshotted.
#[derive(Clone, Debug)]
pub struct RecordingPattern {
    /// Content generator.
    pub source: Arc<dyn PatternSource>,
}

/// A paint source sampled per device pixel.
#[derive(Clone, Debug)]
pub enum Pattern {
    /// Uniform color.
    Solid(Rgba8Premul),
    /// Linear gradient.
    LinearGradient(LinearGradient),
    /// Immutable image.
    Image(ImagePattern),
    /// Live view of a surface.
    Surface(SurfacePattern),
    /// Lazily generated content.
    Recording(RecordingPattern),
}

impl Pattern {
    /// Uniform color.
    pub fn solid(color: Rgba8Premul) -> Self {
        Self::Solid(color)
    }

    /// Live view of `source` with its origin at device `origin`.
    pub fn surface(source: Arc<SurfaceSource>, origin: (i32, i32)) -> Self {
        Self::Surface(SurfacePattern { source, origin })
    }

    /// Lazily generated content.
    pub fn recording(source: Arc<dyn PatternSource>) -> Self {
        Self::Recording(RecordingPattern { source })
    }

    /// Color at device pixel `(x, y)`.
    pub fn sample(&self, x: i32, y: i32) -> Rgba8Premul {
        match self {
            Self::Solid(c) => *c,
            Self::LinearGradient(g) => g.sample(x, y),
            Self::Image(p) => p.image.get(x - p.origin.0, y - p.origin.1),
            Self::Surface(p) => p.source.sample(x - p.origin.0, y - p.origin.1),
            Self::Recording(p) => p.source.sample(x, y),
        }
    }

    /// Device extents outside of which the pattern is transparent, if finite.
    pub fn bounded_extents(&self) -> Option<IntRect> {
        match self {
            Self::Solid(_) | Self::LinearGradient(_) => None,
            Self::Image(p) => Some(p.extents()),
            Self::Surface(p) => Some(p.extents()),
            Self::Recording(p) => p.source.extents(),
        }
    }

    /// Return `true` when sampling may read pixels of surface `id`.
    pub fn reads_from(&self, id: SurfaceId) -> bool {
        match self {
            Self::Surface(p) => p.source.root_id() == id,
            _ => false,
        }
    }

    /// Return `true` for lazily generated content.
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording(_))
    }

    /// Flush pending draws of the surface this pattern views, if any.
    pub fn flush_sources(&self) -> RasterResult<()> {
        match self {
            Self::Surface(p) => p.source.flush_pending(),
            _ => Ok(()),
        }
    }

    /// Deep copy with value semantics: the result never observes later changes to whatever the
    /// pattern views. Live surface views are flushed, then copied into an immutable image.
    pub fn snapshot(&self) -> RasterResult<Self> {
        match self {
            Self::Solid(_) | Self::LinearGradient(_) | Self::Image(_) => Ok(self.clone()),
            Self::Surface(p) => {
                p.source.flush_pending()?;
                let image = ImageData::copy_region(&p.source, p.source.extents())?;
                Ok(Self::Image(ImagePattern::new(Arc::new(image), p.origin)))
            }
            Self::Recording(_) => Err(RasterError::unsupported(
                "recording patterns cannot be snapshotted",
            )),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/paint/pattern.rs"]
mod tests;
