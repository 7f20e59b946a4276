//! Global and adaptive binarization of single-channel 8-bit rasters.

use crate::filter::convolve_separable;
use crate::image::RasterU8;
use crate::util::math::{is_odd_in_range, saturate_u8};
use crate::util::{RasterError, RasterResult};

/// Largest block size accepted by [`adaptive_mean`].
pub const MAX_BLOCK_SIZE: usize = 255;

/// Fixed-cutoff threshold rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdType {
    /// `max_value` where `v > cutoff`, else 0.
    Binary,
    /// 0 where `v > cutoff`, else `max_value`.
    BinaryInv,
    /// `cutoff` where `v > cutoff`, else `v`.
    Truncate,
    /// `v` where `v > cutoff`, else 0.
    ToZero,
    /// 0 where `v > cutoff`, else `v`.
    ToZeroInv,
}

/// Applies a fixed-cutoff rule to every pixel.
pub fn threshold(
    src: &RasterU8,
    cutoff: u8,
    max_value: u8,
    kind: ThresholdType,
) -> RasterResult<RasterU8> {
    src.ensure_gray("input")?;
    Ok(src.map(|v| apply(v, cutoff, max_value, kind)))
}

#[inline]
fn apply(v: u8, cutoff: u8, max_value: u8, kind: ThresholdType) -> u8 {
    let above = v > cutoff;
    match kind {
        ThresholdType::Binary => {
            if above {
                max_value
            } else {
                0
            }
        }
        ThresholdType::BinaryInv => {
            if above {
                0
            } else {
                max_value
            }
        }
        ThresholdType::Truncate => v.min(cutoff),
        ThresholdType::ToZero => {
            if above {
                v
            } else {
                0
            }
        }
        ThresholdType::ToZeroInv => {
            if above {
                0
            } else {
                v
            }
        }
    }
}

/// Builds the 256-bin intensity histogram of a single-channel raster.
pub fn histogram(src: &RasterU8) -> RasterResult<[u64; 256]> {
    src.ensure_gray("input")?;
    let mut hist = [0u64; 256];
    for &v in src.data() {
        hist[usize::from(v)] += 1;
    }
    Ok(hist)
}

/// Selects the cutoff maximizing the between-class variance of `{v <= t}`
/// and `{v > t}` over `t` in `[1, 254]`; ties go to the lowest `t`.
///
/// A histogram that never splits into two populated classes yields 1.
pub fn otsu_level_from_histogram(hist: &[u64; 256]) -> u8 {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return 1;
    }
    let total_f = total as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &n)| i as f64 * n as f64)
        .sum();

    // Class statistics for t = 0, advanced incrementally.
    let mut count_lo = hist[0] as f64;
    let mut sum_lo = 0.0f64;
    let mut best_t = 1u8;
    let mut best_var = 0.0f64;
    for t in 1..=254usize {
        count_lo += hist[t] as f64;
        sum_lo += t as f64 * hist[t] as f64;
        let count_hi = total_f - count_lo;
        if count_lo <= 0.0 || count_hi <= 0.0 {
            continue;
        }
        let w0 = count_lo / total_f;
        let w1 = count_hi / total_f;
        let mu0 = sum_lo / count_lo;
        let mu1 = (sum_all - sum_lo) / count_hi;
        let diff = mu0 - mu1;
        let var = w0 * w1 * diff * diff;
        if var > best_var {
            best_var = var;
            best_t = t as u8;
        }
    }
    best_t
}

/// Computes the Otsu cutoff of a single-channel raster.
pub fn otsu_level(src: &RasterU8) -> RasterResult<u8> {
    Ok(otsu_level_from_histogram(&histogram(src)?))
}

/// Binarizes at the Otsu cutoff; returns the cutoff with the result.
pub fn otsu(src: &RasterU8, max_value: u8, kind: ThresholdType) -> RasterResult<(u8, RasterU8)> {
    let level = otsu_level(src)?;
    Ok((level, threshold(src, level, max_value, kind)?))
}

/// Local-mean binarization.
///
/// Each pixel is compared against the rounded mean of its `block_size`
/// neighborhood (replicate borders) minus `c`: `max_value` where
/// `v > mean - c`, else 0.
pub fn adaptive_mean(
    src: &RasterU8,
    max_value: u8,
    block_size: usize,
    c: f32,
) -> RasterResult<RasterU8> {
    src.ensure_gray("input")?;
    if !is_odd_in_range(block_size, 3, MAX_BLOCK_SIZE) {
        return Err(RasterError::unsupported(
            "block_size",
            "must be odd and at least 3",
        ));
    }
    if !c.is_finite() {
        return Err(RasterError::unsupported("c", "must be finite"));
    }
    let w = vec![1.0 / block_size as f32; block_size];
    let mean = convolve_separable(src, &w, &w);
    let data = src
        .data()
        .iter()
        .zip(mean.data())
        .map(|(&v, &m)| {
            let local = f32::from(saturate_u8(m)) - c;
            if f32::from(v) > local {
                max_value
            } else {
                0
            }
        })
        .collect();
    RasterU8::gray(data, src.width(), src.height())
}
