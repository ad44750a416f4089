use crate::foundation::core::Rgba8Premul;
use crate::foundation::math::{add_sat_u8, lerp_u8, mul_div255_u8};
use crate::paint::style::Operator;

/// Porter-Duff source and destination factors, in 1/255 units.
fn factors(op: Operator, sa: u8, da: u8) -> (u16, u16) {
    let sa = u16::from(sa);
    let da = u16::from(da);
    match op {
        Operator::Clear => (0, 0),
        Operator::Source => (255, 0),
        Operator::Over => (255, 255 - sa),
        Operator::In => (da, 0),
        Operator::Out => (255 - da, 0),
        Operator::Atop => (da, 255 - sa),
        Operator::Dest => (0, 255),
        Operator::DestOver => (255 - da, 255),
        Operator::DestIn => (0, sa),
        Operator::DestOut => (0, 255 - sa),
        Operator::DestAtop => (255 - da, sa),
        Operator::Xor => (255 - da, 255 - sa),
        Operator::Add => (255, 255),
    }
}

/// Combine a premultiplied source and destination pixel with `op` at full coverage.
pub fn blend(op: Operator, src: Rgba8Premul, dst: Rgba8Premul) -> Rgba8Premul {
    let (fa, fb) = factors(op, src.a, dst.a);
    let s = src.to_array();
    let d = dst.to_array();
    Rgba8Premul::from_array(std::array::from_fn(|i| {
        add_sat_u8(
            mul_div255_u8(u16::from(s[i]), fa),
            mul_div255_u8(u16::from(d[i]), fb),
        )
    }))
}

/// Composite `src` onto `dst` with `op` where the shape covers `coverage`/255 of the pixel.
///
/// Operators bounded by the mask interpolate between the untouched destination and the full
/// result. Unbounded operators scale the source by coverage instead, so zero coverage still
/// affects the destination.
pub fn composite(op: Operator, src: Rgba8Premul, dst: Rgba8Premul, coverage: u8) -> Rgba8Premul {
    if op.is_bounded_by_mask() {
        if coverage == 0 {
            return dst;
        }
        let full = blend(op, src, dst);
        if coverage == 255 {
            return full;
        }
        let d = dst.to_array();
        let f = full.to_array();
        Rgba8Premul::from_array(std::array::from_fn(|i| lerp_u8(d[i], f[i], coverage)))
    } else {
        let s = src.to_array();
        let scaled = Rgba8Premul::from_array(std::array::from_fn(|i| {
            mul_div255_u8(u16::from(s[i]), u16::from(coverage))
        }));
        blend(op, scaled, dst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
