use rasterlab::{Channels, ElementType, RasterError, RasterF32, RasterU8, Rect};

#[test]
fn raster_rejects_zero_dimensions() {
    let err = RasterU8::gray(Vec::new(), 0, 3).unwrap_err();
    assert!(matches!(err, RasterError::InvalidInput { .. }));

    let err = RasterU8::filled(4, 0, Channels::Rgb, 0).unwrap_err();
    assert!(matches!(err, RasterError::InvalidInput { .. }));
}

#[test]
fn raster_rejects_length_mismatch() {
    let err = RasterU8::rgb(vec![0; 11], 2, 2).unwrap_err();
    assert_eq!(
        err,
        RasterError::InvalidInput {
            reason: "buffer length does not match width * height * channels",
        }
    );
    assert!(RasterU8::rgb(vec![0; 12], 2, 2).is_ok());
}

#[test]
fn channel_counts_map_to_layouts() {
    assert_eq!(Channels::from_count(1).unwrap(), Channels::Gray);
    assert_eq!(Channels::from_count(3).unwrap(), Channels::Rgb);
    assert!(Channels::from_count(4).is_err());
    assert_eq!(Channels::Rgb.count(), 3);
}

#[test]
fn interleaved_pixels_are_addressed_by_channel() {
    let data: Vec<u8> = (0u8..18).collect();
    let img = RasterU8::rgb(data, 3, 2).unwrap();
    assert_eq!(img.row_len(), 9);
    assert_eq!(img.pixel(1, 1), Some(&[12u8, 13, 14][..]));
    assert_eq!(img.get(2, 0, 2), Some(8));
    assert_eq!(img.get(3, 0, 0), None);
    assert_eq!(img.get(0, 0, 3), None);
    assert_eq!(img.row(1).map(<[u8]>::len), Some(9));
    assert_eq!(img.element_type(), ElementType::U8);
}

#[test]
fn float_rasters_saturate_when_narrowed() {
    let img = RasterF32::gray(vec![-5.0, 12.4, 12.6, 300.0], 2, 2).unwrap();
    assert_eq!(img.element_type(), ElementType::F32);
    assert_eq!(img.to_u8_saturating().data(), &[0, 12, 13, 255]);
    assert_eq!(img.to_u8_saturating().to_f32().data(), &[0.0, 12.0, 13.0, 255.0]);
}

#[test]
fn rect_contains_is_half_open() {
    let r = Rect {
        x: 2,
        y: 3,
        width: 4,
        height: 2,
    };
    assert!(r.contains(2, 3));
    assert!(r.contains(5, 4));
    assert!(!r.contains(6, 4));
    assert!(!r.contains(5, 5));
    assert!(!r.contains(1, 3));
}
