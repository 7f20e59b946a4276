//! Edge detection: gradient-magnitude maps and the Canny extractor.

pub mod canny;

pub use canny::{canny, hysteresis, non_max_suppression, CannyConfig, Direction};

use crate::color::to_gray;
use crate::filter::{gradients, laplacian, magnitude, scale_abs, GradientKernel};
use crate::image::RasterU8;
use crate::util::RasterResult;

/// Gradient-magnitude edge map scaled back to 8 bits.
///
/// Sobel and Scharr combine their x/y responses as `sqrt(gx² + gy²)`; the
/// Laplacian uses its absolute response. Values above 255 saturate. Color
/// input is converted to gray first.
pub fn gradient_edges(src: &RasterU8, kind: GradientKernel) -> RasterResult<RasterU8> {
    let gray = to_gray(src);
    let response = match kind {
        GradientKernel::Laplacian => laplacian(&gray),
        GradientKernel::Sobel | GradientKernel::Scharr => {
            let (gx, gy) = gradients(&gray, kind)?;
            magnitude(&gx, &gy)?
        }
    };
    Ok(scale_abs(&response, 1.0))
}
