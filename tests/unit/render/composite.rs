use super::*;

fn px(r: u8, g: u8, b: u8, a: u8) -> Rgba8Premul {
    Rgba8Premul { r, g, b, a }
}

#[test]
fn over_opaque_source_replaces_destination() {
    let out = blend(Operator::Over, px(255, 0, 0, 255), px(0, 0, 255, 255));
    assert_eq!(out, px(255, 0, 0, 255));
}

#[test]
fn over_half_transparent_source_mixes() {
    let out = blend(Operator::Over, px(0, 0, 128, 128), px(255, 0, 0, 255));
    assert_eq!(out, px(127, 0, 128, 255));
}

#[test]
fn clear_and_source_ignore_destination() {
    let dst = px(10, 20, 30, 255);
    assert_eq!(blend(Operator::Clear, px(1, 1, 1, 255), dst), Rgba8Premul::transparent());
    assert_eq!(blend(Operator::Source, px(0, 0, 0, 0), dst), Rgba8Premul::transparent());
    assert_eq!(blend(Operator::Dest, px(1, 1, 1, 255), dst), dst);
}

#[test]
fn in_and_dest_out_use_the_other_alpha() {
    let src = px(200, 0, 0, 200);
    assert_eq!(blend(Operator::In, src, Rgba8Premul::transparent()), Rgba8Premul::transparent());
    assert_eq!(blend(Operator::In, src, px(0, 0, 0, 255)), src);
    assert_eq!(blend(Operator::DestOut, px(0, 0, 0, 255), px(9, 9, 9, 255)), Rgba8Premul::transparent());
}

#[test]
fn add_saturates() {
    let out = blend(Operator::Add, px(200, 10, 0, 200), px(100, 10, 0, 100));
    assert_eq!(out, px(255, 20, 0, 255));
}

#[test]
fn zero_coverage_keeps_destination_for_bounded_operators() {
    let dst = px(1, 2, 3, 4);
    assert_eq!(composite(Operator::Over, px(255, 255, 255, 255), dst, 0), dst);
    assert_eq!(composite(Operator::Source, px(255, 255, 255, 255), dst, 0), dst);
}

#[test]
fn zero_coverage_clears_destination_for_unbounded_in() {
    let dst = px(50, 50, 50, 255);
    assert_eq!(
        composite(Operator::In, px(255, 0, 0, 255), dst, 0),
        Rgba8Premul::transparent()
    );
    assert_eq!(composite(Operator::DestIn, px(255, 0, 0, 255), dst, 0), Rgba8Premul::transparent());
}

#[test]
fn partial_coverage_interpolates() {
    let out = composite(Operator::Source, px(255, 255, 255, 255), Rgba8Premul::transparent(), 128);
    assert_eq!(out, px(128, 128, 128, 128));
}
