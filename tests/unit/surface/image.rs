use super::*;

#[test]
fn zero_sized_image_is_rejected() {
    assert!(matches!(
        ImageSurface::new(0, 4),
        Err(RasterError::Validation(_))
    ));
}

#[test]
fn sub_view_shares_storage_with_parent() {
    let img = ImageSurface::new(8, 8).unwrap();
    let view = img.create_sub_view(IntRect::new(0, 4, 8, 4)).unwrap();
    view.store(1, 5, Rgba8Premul::opaque(9, 8, 7));
    assert_eq!(img.pixels().load(1, 5), Rgba8Premul::opaque(9, 8, 7));
    assert!(Arc::ptr_eq(view.pixels(), img.pixels()));
}

#[test]
fn sub_view_drops_writes_outside_its_band() {
    let img = ImageSurface::new(8, 8).unwrap();
    let view = img.create_sub_view(IntRect::new(0, 4, 8, 4)).unwrap();
    view.store(1, 1, Rgba8Premul::opaque(255, 0, 0));
    assert_eq!(img.pixels().load(1, 1), Rgba8Premul::transparent());
}

#[test]
fn sub_view_outside_bounds_is_rejected() {
    let img = ImageSurface::new(8, 8).unwrap();
    assert!(img.create_sub_view(IntRect::new(4, 4, 8, 8)).is_err());
}

#[test]
fn begin_modification_bumps_serial_until_finished() {
    let img = ImageSurface::new(2, 2).unwrap();
    img.begin_modification().unwrap();
    img.begin_modification().unwrap();
    assert_eq!(img.serial(), 2);
    img.finish();
    assert!(matches!(img.begin_modification(), Err(RasterError::Finished)));
    assert_eq!(img.serial(), 2);
}

#[test]
fn rgba_image_is_unpremultiplied() {
    let img = ImageSurface::new(1, 1).unwrap();
    img.pixels().store(0, 0, Rgba8Premul::from_straight_rgba(200, 100, 0, 128));
    let out = img.to_rgba_image().unwrap();
    let px = out.get_pixel(0, 0).0;
    assert_eq!(px[3], 128);
    assert!((i32::from(px[0]) - 200).abs() <= 2);
    assert!((i32::from(px[1]) - 100).abs() <= 2);
}

#[test]
fn readback_is_tightly_packed() {
    let img = ImageSurface::new(3, 2).unwrap();
    img.pixels().store(2, 1, Rgba8Premul::opaque(1, 2, 3));
    let bytes = img.to_rgba8();
    assert_eq!(bytes.len(), 3 * 2 * 4);
    assert_eq!(&bytes[(3 + 2) * 4..(3 + 2) * 4 + 4], &[1, 2, 3, 255]);
}
