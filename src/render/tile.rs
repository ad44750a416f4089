use crate::foundation::core::IntRect;
use crate::foundation::error::RasterResult;
use crate::surface::image::{ImageSurface, ImageView};

/// Upper bound on the number of bands a single flush is split into.
pub const MAX_TILES: usize = 32;

/// One horizontal band of a flush, bound to a view sharing the destination's pixels.
#[derive(Clone, Debug)]
pub struct Tile {
    /// Writable window onto the destination.
    pub view: ImageView,
    /// Device rectangle of the band.
    pub rect: IntRect,
}

/// Split `dirty ∩ bounds` into at most `workers` horizontal bands of equal height.
///
/// The band count is clamped to `[1, min(height, MAX_TILES)]`; the last band absorbs the
/// remainder so the bands exactly tile the clamped rectangle. Returns no bands when the
/// clamped rectangle is empty.
pub fn partition_bands(dirty: IntRect, bounds: IntRect, workers: usize) -> Vec<IntRect> {
    let region = dirty.intersect(bounds);
    if region.is_empty() {
        return Vec::new();
    }
    let height = region.height as usize;
    let count = workers.clamp(1, height.min(MAX_TILES));
    let band = (height / count) as i32;

    let mut bands = Vec::with_capacity(count);
    for i in 0..count as i32 {
        let y = region.y + i * band;
        let h = if i == count as i32 - 1 {
            region.bottom() - y
        } else {
            band
        };
        bands.push(IntRect::new(region.x, y, region.width, h));
    }
    bands
}

/// Tiles for one flush of `surface`, each with a sub-view over its band.
pub fn partition(
    surface: &ImageSurface,
    dirty: IntRect,
    workers: usize,
) -> RasterResult<Vec<Tile>> {
    partition_bands(dirty, surface.bounds(), workers)
        .into_iter()
        .map(|rect| {
            Ok(Tile {
                view: surface.create_sub_view(rect)?,
                rect,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/tile.rs"]
mod tests;
