//! Color model conversions.
//!
//! Three-channel rasters are interpreted as R, G, B. HSV is kept in floating
//! point (H in degrees `[0, 360)`, S and V in `[0, 1]`) so that a round trip
//! back to RGB only loses the final rounding step; [`hsv_to_display`] packs
//! it into 8 bits for viewing.

use crate::image::{Channels, RasterF32, RasterU8};
use crate::util::math::saturate_u8;
use crate::util::{RasterError, RasterResult};

const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Converts to a single luma channel; single-channel input is copied.
pub fn to_gray(src: &RasterU8) -> RasterU8 {
    match src.channels() {
        Channels::Gray => src.clone(),
        Channels::Rgb => {
            let data = src
                .data()
                .chunks_exact(3)
                .map(|px| {
                    saturate_u8(
                        LUMA_R * f32::from(px[0]) + LUMA_G * f32::from(px[1]) + LUMA_B * f32::from(px[2]),
                    )
                })
                .collect();
            RasterU8::from_parts(data, src.width(), src.height(), Channels::Gray)
        }
    }
}

/// Replicates a single channel into three; RGB input is copied.
pub fn gray_to_rgb(src: &RasterU8) -> RasterU8 {
    match src.channels() {
        Channels::Rgb => src.clone(),
        Channels::Gray => {
            let data = src.data().iter().flat_map(|&v| [v, v, v]).collect();
            RasterU8::from_parts(data, src.width(), src.height(), Channels::Rgb)
        }
    }
}

/// Reverses the channel order (RGB <-> BGR).
pub fn swap_rb(src: &RasterU8) -> RasterResult<RasterU8> {
    ensure_rgb(src.channels(), "channels")?;
    let data = src
        .data()
        .chunks_exact(3)
        .flat_map(|px| [px[2], px[1], px[0]])
        .collect();
    Ok(RasterU8::from_parts(data, src.width(), src.height(), Channels::Rgb))
}

/// Converts RGB to floating-point HSV.
pub fn rgb_to_hsv(src: &RasterU8) -> RasterResult<RasterF32> {
    ensure_rgb(src.channels(), "channels")?;
    let data = src
        .data()
        .chunks_exact(3)
        .flat_map(|px| {
            let (h, s, v) = hsv_from_rgb(px[0], px[1], px[2]);
            [h, s, v]
        })
        .collect();
    Ok(RasterF32::from_parts(data, src.width(), src.height(), Channels::Rgb))
}

/// Converts floating-point HSV back to 8-bit RGB.
pub fn hsv_to_rgb(src: &RasterF32) -> RasterResult<RasterU8> {
    ensure_rgb(src.channels(), "channels")?;
    let data = src
        .data()
        .chunks_exact(3)
        .flat_map(|px| {
            let (r, g, b) = rgb_from_hsv(px[0], px[1], px[2]);
            [saturate_u8(r * 255.0), saturate_u8(g * 255.0), saturate_u8(b * 255.0)]
        })
        .collect();
    Ok(RasterU8::from_parts(data, src.width(), src.height(), Channels::Rgb))
}

/// Packs HSV into 8 bits: H/2 in `[0, 180)`, S and V scaled to `[0, 255]`.
pub fn hsv_to_display(src: &RasterF32) -> RasterResult<RasterU8> {
    ensure_rgb(src.channels(), "channels")?;
    let data = src
        .data()
        .chunks_exact(3)
        .flat_map(|px| {
            [
                saturate_u8(px[0] * 0.5) % 180,
                saturate_u8(px[1] * 255.0),
                saturate_u8(px[2] * 255.0),
            ]
        })
        .collect();
    Ok(RasterU8::from_parts(data, src.width(), src.height(), Channels::Rgb))
}

fn ensure_rgb(channels: Channels, name: &'static str) -> RasterResult<()> {
    if channels != Channels::Rgb {
        return Err(RasterError::unsupported(name, "expected a three-channel raster"));
    }
    Ok(())
}

fn hsv_from_rgb(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max } else { 0.0 };
    let h = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, s, max)
}

fn rgb_from_hsv(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let c = v * s;
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    (r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::{hsv_to_display, rgb_to_hsv, swap_rb, to_gray};
    use crate::image::{Channels, RasterU8};

    #[test]
    fn gray_weights_primaries() {
        let img = RasterU8::rgb(vec![255, 0, 0, 0, 255, 0, 0, 0, 255], 3, 1).unwrap();
        let gray = to_gray(&img);
        assert_eq!(gray.channels(), Channels::Gray);
        assert_eq!(gray.data(), &[76, 150, 29]);
    }

    #[test]
    fn gray_input_is_identity() {
        let img = RasterU8::gray(vec![1, 2, 3, 4], 2, 2).unwrap();
        assert_eq!(to_gray(&img), img);
    }

    #[test]
    fn swap_rejects_single_channel() {
        let img = RasterU8::gray(vec![0; 4], 2, 2).unwrap();
        assert!(swap_rb(&img).is_err());
    }

    #[test]
    fn pure_red_has_zero_hue() {
        let img = RasterU8::rgb(vec![255, 0, 0, 0, 0, 255], 2, 1).unwrap();
        let hsv = rgb_to_hsv(&img).unwrap();
        assert_eq!(&hsv.data()[0..3], &[0.0, 1.0, 1.0]);
        assert!((hsv.data()[3] - 240.0).abs() < 1e-4);
        let packed = hsv_to_display(&hsv).unwrap();
        assert_eq!(packed.data(), &[0, 255, 255, 120, 255, 255]);
    }
}
