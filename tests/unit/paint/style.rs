use super::*;

#[test]
fn unbounded_operators_are_flagged() {
    for op in [Operator::In, Operator::Out, Operator::DestIn, Operator::DestAtop] {
        assert!(!op.is_bounded_by_mask(), "{op:?}");
        assert!(!op.is_bounded_by_source(), "{op:?}");
    }
    assert!(Operator::Over.is_bounded_by_mask());
    assert!(Operator::Over.is_bounded_by_source());
    assert!(Operator::Source.is_bounded_by_mask());
    assert!(!Operator::Source.is_bounded_by_source());
}

#[test]
fn fill_rules_disagree_on_even_winding() {
    assert!(FillRule::Winding.is_inside(2));
    assert!(!FillRule::EvenOdd.is_inside(2));
    assert!(FillRule::EvenOdd.is_inside(-1));
    assert!(!FillRule::Winding.is_inside(0));
}

#[test]
fn miter_joins_widen_the_stroke_estimate() {
    let base = StrokeStyle::new(4.0).with_join(LineJoin::Round);
    let miter = StrokeStyle::new(4.0).with_join(LineJoin::Miter);
    let (rx, ry) = base.max_device_distance(Affine::IDENTITY);
    let (mx, my) = miter.max_device_distance(Affine::IDENTITY);
    assert_eq!((rx, ry), (2.0, 2.0));
    assert!(mx > rx && my > ry);
}

#[test]
fn device_distance_follows_ctm_scale() {
    let style = StrokeStyle::new(2.0).with_join(LineJoin::Bevel);
    let (dx, dy) = style.max_device_distance(Affine::scale_non_uniform(3.0, 1.0));
    assert!((dx - 3.0).abs() < 1e-9);
    assert!((dy - 1.0).abs() < 1e-9);
}

#[test]
fn dashes_are_copied_into_the_style() {
    let dashes = vec![1.0, 2.0];
    let style = StrokeStyle::new(1.0).with_dashes(0.5, &dashes);
    drop(dashes);
    assert_eq!(style.dashes.as_slice(), &[1.0, 2.0]);
    assert_eq!(style.dash_offset, 0.5);
}
