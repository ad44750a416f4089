use super::*;

fn assert_exact_cover(bands: &[IntRect], region: IntRect) {
    let mut y = region.y;
    for b in bands {
        assert_eq!(b.x, region.x);
        assert_eq!(b.width, region.width);
        assert_eq!(b.y, y, "bands must be contiguous and disjoint");
        assert!(b.height > 0);
        y = b.bottom();
    }
    assert_eq!(y, region.bottom());
}

#[test]
fn last_band_absorbs_remainder() {
    let bands = partition_bands(IntRect::new(3, 10, 20, 10), IntRect::from_size(100, 100), 4);
    let heights: Vec<i32> = bands.iter().map(|b| b.height).collect();
    assert_eq!(heights, vec![2, 2, 2, 4]);
    assert_exact_cover(&bands, IntRect::new(3, 10, 20, 10));
}

#[test]
fn every_worker_count_tiles_exactly() {
    let bounds = IntRect::from_size(64, 48);
    let dirty = IntRect::new(-5, 7, 40, 33);
    let region = dirty.intersect(bounds);
    for k in 1..=region.height as usize {
        let bands = partition_bands(dirty, bounds, k);
        assert_eq!(bands.len(), k.min(MAX_TILES));
        assert_exact_cover(&bands, region);
    }
}

#[test]
fn worker_count_is_clamped_to_height_and_max() {
    let bounds = IntRect::from_size(10, 1000);
    assert_eq!(partition_bands(IntRect::new(0, 5, 10, 1), bounds, 8).len(), 1);
    assert_eq!(partition_bands(IntRect::new(0, 0, 10, 3), bounds, 8).len(), 3);
    assert_eq!(partition_bands(bounds, bounds, 1000).len(), MAX_TILES);
    assert_eq!(partition_bands(bounds, bounds, 0).len(), 1);
}

#[test]
fn empty_or_offscreen_dirty_yields_no_bands() {
    let bounds = IntRect::from_size(10, 10);
    assert!(partition_bands(IntRect::empty(), bounds, 4).is_empty());
    assert!(partition_bands(IntRect::new(20, 20, 5, 5), bounds, 4).is_empty());
}

#[test]
fn unbounded_dirty_is_clamped_to_surface() {
    let bounds = IntRect::from_size(16, 9);
    let bands = partition_bands(IntRect::unbounded(), bounds, 3);
    assert_exact_cover(&bands, bounds);
}

#[test]
fn tiles_share_surface_storage() {
    let surface = ImageSurface::new(8, 8).unwrap();
    let tiles = partition(&surface, IntRect::from_size(8, 8), 2).unwrap();
    assert_eq!(tiles.len(), 2);
    for t in &tiles {
        assert!(std::sync::Arc::ptr_eq(t.view.pixels(), surface.pixels()));
        assert_eq!(t.view.bounds(), t.rect);
    }
}
