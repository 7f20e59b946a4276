//! Dense and separable convolution with replicate-edge borders.

use crate::filter::kernel::{validate_size, Kernel};
use crate::image::{Raster, RasterF32, Sample};
use crate::util::math::clamp_index;
use crate::util::par::fill_rows;

/// Applies `kernel` to every channel of `src`, producing signed output.
pub fn convolve<T: Sample>(src: &Raster<T>, kernel: &Kernel) -> RasterF32 {
    let width = src.width();
    let height = src.height();
    let cn = src.channels().count();
    let r = kernel.radius() as isize;
    let size = kernel.size();
    let weights = kernel.weights();
    let data = src.data();

    let mut out = src.zeros_like::<f32>();
    fill_rows(out.data_mut(), width * cn, |y, row| {
        for x in 0..width {
            for c in 0..cn {
                let mut acc = 0.0f32;
                for ky in 0..size {
                    let sy = clamp_index(y as isize + ky as isize - r, height);
                    let base = sy * width;
                    let krow = &weights[ky * size..(ky + 1) * size];
                    for (kx, &w) in krow.iter().enumerate() {
                        let sx = clamp_index(x as isize + kx as isize - r, width);
                        acc += w * data[(base + sx) * cn + c].to_f32();
                    }
                }
                row[x * cn + c] = acc;
            }
        }
    });
    out
}

/// Applies a separable kernel: `row_weights` along x, then `col_weights`
/// along y. Both lengths must be odd.
pub fn convolve_separable<T: Sample>(
    src: &Raster<T>,
    row_weights: &[f32],
    col_weights: &[f32],
) -> RasterF32 {
    debug_assert!(validate_size(row_weights.len()).is_ok());
    debug_assert!(validate_size(col_weights.len()).is_ok());

    let width = src.width();
    let height = src.height();
    let cn = src.channels().count();
    let data = src.data();

    let rx = (row_weights.len() / 2) as isize;
    let mut horizontal = src.zeros_like::<f32>();
    fill_rows(horizontal.data_mut(), width * cn, |y, row| {
        let base = y * width;
        for x in 0..width {
            for c in 0..cn {
                let mut acc = 0.0f32;
                for (k, &w) in row_weights.iter().enumerate() {
                    let sx = clamp_index(x as isize + k as isize - rx, width);
                    acc += w * data[(base + sx) * cn + c].to_f32();
                }
                row[x * cn + c] = acc;
            }
        }
    });

    let ry = (col_weights.len() / 2) as isize;
    let tmp = horizontal.data();
    let mut out = src.zeros_like::<f32>();
    fill_rows(out.data_mut(), width * cn, |y, row| {
        for (i, dst) in row.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &w) in col_weights.iter().enumerate() {
                let sy = clamp_index(y as isize + k as isize - ry, height);
                acc += w * tmp[sy * width * cn + i];
            }
            *dst = acc;
        }
    });
    out
}
