use super::*;
use kurbo::Rect;

#[test]
fn unbounded_clip_has_unbounded_extents() {
    let c = Clip::unbounded();
    assert!(c.is_unbounded());
    assert!(c.extents().is_unbounded());
    assert!(c.contains(-1000, 1000));
}

#[test]
fn intersect_rect_narrows_region() {
    let c = Clip::from_rects([IntRect::new(0, 0, 10, 10), IntRect::new(20, 0, 10, 10)]);
    let narrowed = c.intersect_rect(IntRect::new(5, 0, 20, 4));
    assert_eq!(
        narrowed.rects().unwrap(),
        &[IntRect::new(5, 0, 5, 4), IntRect::new(20, 0, 5, 4)]
    );
    assert_eq!(narrowed.extents(), IntRect::new(5, 0, 20, 4));
    assert!(!narrowed.contains(12, 1));
}

#[test]
fn disjoint_intersection_is_all_clipped() {
    let c = Clip::from_rect(IntRect::new(0, 0, 4, 4)).intersect_rect(IntRect::new(8, 8, 2, 2));
    assert!(c.is_all_clipped());
    assert!(Clip::all_clipped().is_all_clipped());
}

#[test]
fn clip_path_limits_extents_and_coverage() {
    let path = Rect::new(2.0, 2.0, 6.0, 6.0).to_path(0.1);
    let c = Clip::unbounded().with_path(path, FillRule::Winding);
    assert_eq!(c.extents(), IntRect::new(2, 2, 4, 4));
    assert!(c.contains(3, 3));
    assert!(!c.contains(7, 3));
}

#[test]
fn cloned_clip_is_independent() {
    let original = Clip::from_rect(IntRect::new(0, 0, 4, 4));
    let copy = original.clone();
    let original = original.intersect_rect(IntRect::new(0, 0, 1, 1));
    assert_eq!(copy.extents(), IntRect::new(0, 0, 4, 4));
    assert_eq!(original.extents(), IntRect::new(0, 0, 1, 1));
}

#[test]
fn far_apart_rects_have_finite_extents() {
    let c = Clip::from_rects([
        IntRect::new(-2_000_000_000, 0, 10, 10),
        IntRect::new(2_000_000_000, 0, 10, 10),
    ]);
    let e = c.extents();
    assert_eq!(e.y, 0);
    assert_eq!(e.height, 10);
    assert!(!c.is_all_clipped());
    assert!(c.intersect_rect(IntRect::from_size(100, 100)).is_all_clipped());
}
