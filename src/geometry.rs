//! Resizing and brightness/contrast adjustment.

use crate::image::{Raster, RasterU8};
use crate::util::math::saturate_u8;
use crate::util::par::fill_rows;
use crate::util::{RasterError, RasterResult};

/// Smallest accepted resize percentage.
pub const MIN_SCALE_PERCENT: f32 = 10.0;
/// Largest accepted resize percentage.
pub const MAX_SCALE_PERCENT: f32 = 200.0;

/// Resizes by a percentage of the current dimensions.
///
/// Target dimensions are `round(dim * percent / 100)`, at least 1.
pub fn resize_percent(src: &RasterU8, percent: f32) -> RasterResult<RasterU8> {
    if !percent.is_finite() || !(MIN_SCALE_PERCENT..=MAX_SCALE_PERCENT).contains(&percent) {
        return Err(RasterError::unsupported(
            "scale_percent",
            "must be finite and within [10, 200]",
        ));
    }
    let scale = |dim: usize| ((dim as f64 * f64::from(percent) / 100.0).round() as usize).max(1);
    resize(src, scale(src.width()), scale(src.height()))
}

/// Resizes to explicit dimensions.
///
/// Each axis is resampled independently: bilinear when the axis grows or
/// keeps its length, area-weighted averaging when it shrinks. Pixel centers
/// map as `src = (dst + 0.5) * scale - 0.5`.
pub fn resize(src: &RasterU8, width: usize, height: usize) -> RasterResult<RasterU8> {
    if width == 0 || height == 0 {
        return Err(RasterError::unsupported("size", "target dimensions must be positive"));
    }
    if width == src.width() && height == src.height() {
        return Ok(src.clone());
    }

    let cn = src.channels().count();
    let cols = axis_taps(src.width(), width);
    let rows = axis_taps(src.height(), height);

    // Horizontal pass keeps the source row count.
    let src_row = src.row_len();
    let mid_row = width * cn;
    let mut mid = vec![0.0f32; mid_row * src.height()];
    let data = src.data();
    fill_rows(&mut mid, mid_row, |y, row| {
        let line = &data[y * src_row..(y + 1) * src_row];
        for (x, taps) in cols.iter().enumerate() {
            for c in 0..cn {
                row[x * cn + c] = taps.iter().map(|&(i, w)| w * f32::from(line[i * cn + c])).sum();
            }
        }
    });

    let mut out = vec![0u8; mid_row * height];
    fill_rows(&mut out, mid_row, |y, row| {
        let taps = &rows[y];
        for (i, v) in row.iter_mut().enumerate() {
            *v = saturate_u8(taps.iter().map(|&(sy, w)| w * mid[sy * mid_row + i]).sum());
        }
    });
    Raster::new(out, width, height, src.channels())
}

/// Source indices and weights contributing to each destination index.
fn axis_taps(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            if dst_len >= src_len {
                bilinear_taps(d, scale, src_len)
            } else {
                area_taps(d, scale, src_len)
            }
        })
        .collect()
}

fn bilinear_taps(d: usize, scale: f64, src_len: usize) -> Vec<(usize, f32)> {
    let max = (src_len - 1) as f64;
    let s = ((d as f64 + 0.5) * scale - 0.5).clamp(0.0, max);
    let i0 = s.floor() as usize;
    let i1 = (i0 + 1).min(src_len - 1);
    let f = (s - i0 as f64) as f32;
    if i0 == i1 || f == 0.0 {
        vec![(i0, 1.0)]
    } else {
        vec![(i0, 1.0 - f), (i1, f)]
    }
}

fn area_taps(d: usize, scale: f64, src_len: usize) -> Vec<(usize, f32)> {
    let start = d as f64 * scale;
    let end = ((d + 1) as f64 * scale).min(src_len as f64);
    let mut taps = Vec::new();
    let mut i = start.floor() as usize;
    while (i as f64) < end && i < src_len {
        let overlap = end.min(i as f64 + 1.0) - start.max(i as f64);
        if overlap > 1e-9 {
            taps.push((i, (overlap / scale) as f32));
        }
        i += 1;
    }
    taps
}

/// Linear brightness/contrast: `clamp(round(alpha * v + beta), 0, 255)`.
pub fn adjust(src: &RasterU8, alpha: f32, beta: f32) -> RasterResult<RasterU8> {
    if !alpha.is_finite() || alpha <= 0.0 {
        return Err(RasterError::unsupported("alpha", "must be finite and positive"));
    }
    if !beta.is_finite() || !(-255.0..=255.0).contains(&beta) {
        return Err(RasterError::unsupported("beta", "must lie within [-255, 255]"));
    }
    Ok(src.map(|v| saturate_u8(alpha * f32::from(v) + beta)))
}

#[cfg(test)]
mod tests {
    use super::{adjust, area_taps, resize, resize_percent};
    use crate::image::RasterU8;
    use crate::util::RasterError;

    #[test]
    fn percent_outside_range_is_rejected() {
        let img = RasterU8::gray(vec![0; 16], 4, 4).unwrap();
        for p in [5.0, 250.0, f32::NAN] {
            assert!(matches!(
                resize_percent(&img, p).unwrap_err(),
                RasterError::UnsupportedParameter { .. }
            ));
        }
    }

    #[test]
    fn halving_averages_blocks() {
        let img = RasterU8::gray(vec![0, 100, 50, 50, 20, 40, 50, 50], 4, 2).unwrap();
        let out = resize(&img, 2, 1).unwrap();
        assert_eq!(out.data(), &[40, 50]);
    }

    #[test]
    fn area_weights_sum_to_one() {
        for (src, dst) in [(10, 3), (7, 5), (100, 9)] {
            let scale = src as f64 / dst as f64;
            for d in 0..dst {
                let total: f32 = area_taps(d, scale, src).iter().map(|t| t.1).sum();
                assert!((total - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn doubling_a_flat_image_stays_flat() {
        let img = RasterU8::rgb(vec![7, 8, 9].repeat(6), 3, 2).unwrap();
        let out = resize_percent(&img, 200.0).unwrap();
        assert_eq!((out.width(), out.height()), (6, 4));
        assert!(out.data().chunks(3).all(|px| px == [7, 8, 9]));
    }

    #[test]
    fn adjust_saturates() {
        let img = RasterU8::gray(vec![0, 100, 200], 3, 1).unwrap();
        let out = adjust(&img, 1.5, 10.0).unwrap();
        assert_eq!(out.data(), &[10, 160, 255]);
        assert!(adjust(&img, 0.0, 0.0).is_err());
        assert!(adjust(&img, 1.0, 300.0).is_err());
    }
}
