//! Convolution engine: smoothing filters and derivative kernels.
//!
//! All filters use replicate-edge borders and return freshly allocated
//! rasters. Blur sizes must be odd in `[1, 31]`; size 1 is an exact identity.

mod convolve;
pub mod kernel;

pub use convolve::{convolve, convolve_separable};
pub use kernel::{default_sigma, gaussian_weights, Kernel, MAX_KERNEL_SIZE};

use crate::filter::kernel::validate_size;
use crate::image::{Raster, RasterF32, RasterU8, Sample};
use crate::util::math::{clamp_index, saturate_u8};
use crate::util::par::fill_rows;
use crate::util::{RasterError, RasterResult};

type Kernel3 = [f32; 9];

const SOBEL_X: Kernel3 = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const SOBEL_Y: Kernel3 = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];
const SCHARR_X: Kernel3 = [-3.0, 0.0, 3.0, -10.0, 0.0, 10.0, -3.0, 0.0, 3.0];
const SCHARR_Y: Kernel3 = [-3.0, -10.0, -3.0, 0.0, 0.0, 0.0, 3.0, 10.0, 3.0];
const LAPLACIAN: Kernel3 = [0.0, 1.0, 0.0, 1.0, -4.0, 1.0, 0.0, 1.0, 0.0];

/// 3×3 derivative kernels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradientKernel {
    Sobel,
    /// Better rotational symmetry than Sobel.
    Scharr,
    /// Second derivative; isotropic, so it has no x/y pair.
    Laplacian,
}

impl GradientKernel {
    /// Returns the kernel(s): an x/y pair for first derivatives, a single
    /// kernel for the Laplacian.
    pub fn kernels(self) -> (Kernel, Option<Kernel>) {
        let make = |w: &Kernel3| Kernel::from_fixed3(w);
        match self {
            GradientKernel::Sobel => (make(&SOBEL_X), Some(make(&SOBEL_Y))),
            GradientKernel::Scharr => (make(&SCHARR_X), Some(make(&SCHARR_Y))),
            GradientKernel::Laplacian => (make(&LAPLACIAN), None),
        }
    }
}

/// Uniform averaging blur.
pub fn box_blur(src: &RasterU8, size: usize) -> RasterResult<RasterU8> {
    validate_size(size)?;
    let w = vec![1.0 / size as f32; size];
    Ok(convolve_separable(src, &w, &w).to_u8_saturating())
}

/// Gaussian blur rounded back to 8 bits.
pub fn gaussian_blur(src: &RasterU8, size: usize, sigma: Option<f32>) -> RasterResult<RasterU8> {
    Ok(gaussian_smooth(src, size, sigma)?.to_u8_saturating())
}

/// Gaussian blur kept in floating point (used ahead of gradient stages).
pub fn gaussian_smooth<T: Sample>(
    src: &Raster<T>,
    size: usize,
    sigma: Option<f32>,
) -> RasterResult<RasterF32> {
    let g = gaussian_weights(size, sigma)?;
    Ok(convolve_separable(src, &g, &g))
}

/// Median blur: each output element is the middle value of its sorted
/// `size × size` window, per channel.
pub fn median_blur(src: &RasterU8, size: usize) -> RasterResult<RasterU8> {
    validate_size(size)?;
    if size == 1 {
        return Ok(src.clone());
    }
    let width = src.width();
    let height = src.height();
    let cn = src.channels().count();
    let r = (size / 2) as isize;
    let data = src.data();
    let mid = size * size / 2;

    let mut out = src.zeros_like::<u8>();
    fill_rows(out.data_mut(), width * cn, |y, row| {
        let mut window = Vec::with_capacity(size * size);
        for x in 0..width {
            for c in 0..cn {
                window.clear();
                for dy in -r..=r {
                    let sy = clamp_index(y as isize + dy, height);
                    for dx in -r..=r {
                        let sx = clamp_index(x as isize + dx, width);
                        window.push(data[(sy * width + sx) * cn + c]);
                    }
                }
                window.sort_unstable();
                row[x * cn + c] = window[mid];
            }
        }
    });
    Ok(out)
}

/// Signed first derivatives `(gx, gy)`.
///
/// Fails for [`GradientKernel::Laplacian`], which has no directional pair;
/// use [`laplacian`] instead.
pub fn gradients<T: Sample>(
    src: &Raster<T>,
    kind: GradientKernel,
) -> RasterResult<(RasterF32, RasterF32)> {
    match kind.kernels() {
        (kx, Some(ky)) => Ok((convolve(src, &kx), convolve(src, &ky))),
        (_, None) => Err(RasterError::unsupported(
            "gradient_kernel",
            "the Laplacian has no x/y derivative pair",
        )),
    }
}

/// Signed 3×3 Laplacian response.
pub fn laplacian<T: Sample>(src: &Raster<T>) -> RasterF32 {
    let (k, _) = GradientKernel::Laplacian.kernels();
    convolve(src, &k)
}

/// Euclidean magnitude `sqrt(gx² + gy²)` of two equally shaped rasters.
pub fn magnitude(gx: &RasterF32, gy: &RasterF32) -> RasterResult<RasterF32> {
    if gx.width() != gy.width() || gx.height() != gy.height() || gx.channels() != gy.channels() {
        return Err(RasterError::InvalidInput {
            reason: "gradient components differ in shape",
        });
    }
    let data = gx
        .data()
        .iter()
        .zip(gy.data())
        .map(|(&a, &b)| (a * a + b * b).sqrt())
        .collect();
    Ok(RasterF32::from_parts(
        data,
        gx.width(),
        gx.height(),
        gx.channels(),
    ))
}

/// Scales, takes the absolute value, and saturates into 8 bits.
pub fn scale_abs(src: &RasterF32, scale: f32) -> RasterU8 {
    src.map(|v| saturate_u8((v * scale).abs()))
}

#[cfg(test)]
mod tests {
    use super::{box_blur, gaussian_blur, gradients, laplacian, median_blur, GradientKernel};
    use crate::image::RasterU8;

    fn ramp(width: usize, height: usize) -> RasterU8 {
        let data = (0..width * height)
            .map(|i| ((i % width) * 10) as u8)
            .collect();
        RasterU8::gray(data, width, height).unwrap()
    }

    #[test]
    fn blur_rejects_even_sizes() {
        let img = ramp(4, 4);
        assert!(box_blur(&img, 2).is_err());
        assert!(gaussian_blur(&img, 0, None).is_err());
        assert!(median_blur(&img, 4).is_err());
    }

    #[test]
    fn sobel_responds_to_horizontal_ramp() {
        let img = ramp(5, 3);
        let (gx, gy) = gradients(&img, GradientKernel::Sobel).unwrap();
        // Interior: (20 - 0) * (1 + 2 + 1) = 80 per 10-step ramp over two pixels.
        assert_eq!(gx.get(2, 1, 0), Some(80.0));
        assert_eq!(gy.get(2, 1, 0), Some(0.0));
    }

    #[test]
    fn laplacian_of_linear_ramp_vanishes_inside() {
        let img = ramp(5, 3);
        let lap = laplacian(&img);
        assert_eq!(lap.get(2, 1, 0), Some(0.0));
        assert!(gradients(&img, GradientKernel::Laplacian).is_err());
    }
}
