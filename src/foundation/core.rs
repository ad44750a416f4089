use std::sync::atomic::{AtomicU64, Ordering};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

const UNBOUNDED_MIN: i32 = i32::MIN / 4;
const UNBOUNDED_MAX: i32 = i32::MAX / 4;

/// Axis-aligned integer rectangle in device space.
///
/// `width`/`height` values `<= 0` describe an empty rectangle. Extents produced by the journal
/// are always conservative: they may cover more pixels than an operation touches, never fewer.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct IntRect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl IntRect {
    /// Create a rectangle from origin and size.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The empty rectangle.
    pub const fn empty() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// A rectangle large enough to stand in for "no bound" in every device-space computation.
    pub const fn unbounded() -> Self {
        Self::new(
            UNBOUNDED_MIN,
            UNBOUNDED_MIN,
            UNBOUNDED_MAX - UNBOUNDED_MIN,
            UNBOUNDED_MAX - UNBOUNDED_MIN,
        )
    }

    /// Rectangle spanning `[x0, x1) x [y0, y1)`, clamped to the unbounded range so that its size
    /// always fits an `i32`.
    pub fn from_edges(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        let (x0, y0) = (x0.max(UNBOUNDED_MIN), y0.max(UNBOUNDED_MIN));
        let (x1, y1) = (x1.min(UNBOUNDED_MAX), y1.min(UNBOUNDED_MAX));
        if x1 <= x0 || y1 <= y0 {
            return Self::empty();
        }
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Return `true` when the rectangle covers no pixel.
    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Return `true` when this is [`IntRect::unbounded`].
    pub fn is_unbounded(self) -> bool {
        self == Self::unbounded()
    }

    /// Right edge (exclusive).
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Intersection of two rectangles; empty when they do not overlap.
    pub fn intersect(self, other: Self) -> Self {
        Self::from_edges(
            self.x.max(other.x),
            self.y.max(other.y),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        )
    }

    /// Return `true` when the rectangles share at least one pixel.
    pub fn intersects(self, other: Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both inputs. Empty inputs are ignored.
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Return `true` when pixel `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Return `true` when `other` lies fully inside `self`.
    pub fn contains_rect(self, other: Self) -> bool {
        other.is_empty() || self.intersect(other) == other
    }

    /// Smallest integer rectangle covering a floating-point rectangle.
    ///
    /// Non-finite or huge coordinates saturate to the unbounded range.
    pub fn from_rect_outer(r: Rect) -> Self {
        fn clamp(v: f64) -> i32 {
            if v.is_nan() {
                return 0;
            }
            v.clamp(f64::from(UNBOUNDED_MIN), f64::from(UNBOUNDED_MAX)) as i32
        }

        Self::from_edges(
            clamp(r.x0.min(r.x1).floor()),
            clamp(r.y0.min(r.y1).floor()),
            clamp(r.x0.max(r.x1).ceil()),
            clamp(r.y0.max(r.y1).ceil()),
        )
    }

    /// Convert to a kurbo rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Fully opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Pack into the storage word layout (`r` in the low byte, `a` in the high byte).
    pub fn to_word(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    /// Unpack from the storage word layout.
    pub fn from_word(word: u32) -> Self {
        let [r, g, b, a] = word.to_le_bytes();
        Self { r, g, b, a }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Build from `[r, g, b, a]`.
    pub fn from_array(c: [u8; 4]) -> Self {
        Self {
            r: c[0],
            g: c[1],
            b: c[2],
            a: c[3],
        }
    }
}

/// Process-unique identity of a destination surface.
///
/// Used by the deferral gate to detect patterns that read back from the surface being drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

impl SurfaceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
