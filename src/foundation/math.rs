pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

/// Linear blend `a + (b - a) * t / 255` on a single channel.
pub(crate) fn lerp_u8(a: u8, b: u8, t: u8) -> u8 {
    let it = 255u16 - u16::from(t);
    add_sat_u8(
        mul_div255_u8(u16::from(a), it),
        mul_div255_u8(u16::from(b), u16::from(t)),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
