//! Multi-stage Canny edge extraction.
//!
//! Stages: Gaussian smoothing, Sobel gradients, four-bin direction
//! quantization, non-maximum suppression, and hysteresis. The result is a
//! binary `{0, 255}` map whose edges are one pixel wide.

use crate::color::to_gray;
use crate::filter::{gaussian_smooth, gradients, magnitude, GradientKernel};
use crate::image::{Channels, RasterF32, RasterU8};
use crate::trace::{trace_event, trace_span};
use crate::util::{RasterError, RasterResult};

const TAN_22_5_DEG: f32 = 0.414_213_57;

/// Canny parameters. Cutoffs apply to the L2 Sobel magnitude.
#[derive(Clone, Debug, PartialEq)]
pub struct CannyConfig {
    /// Weak-edge cutoff.
    pub low: f32,
    /// Strong-edge cutoff; must not be below `low`.
    pub high: f32,
    /// Odd Gaussian size used before differentiation.
    pub blur_size: usize,
    /// Gaussian sigma; derived from `blur_size` when `None`.
    pub sigma: Option<f32>,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            low: 100.0,
            high: 200.0,
            blur_size: 5,
            sigma: None,
        }
    }
}

impl CannyConfig {
    /// Checks cutoff ordering and ranges.
    pub fn validate(&self) -> RasterResult<()> {
        if !self.low.is_finite() || self.low < 0.0 {
            return Err(RasterError::unsupported("low", "must be finite and non-negative"));
        }
        if !self.high.is_finite() || self.high < 0.0 {
            return Err(RasterError::unsupported("high", "must be finite and non-negative"));
        }
        if self.high < self.low {
            return Err(RasterError::unsupported(
                "high",
                "high cutoff must not be below the low cutoff",
            ));
        }
        crate::filter::kernel::validate_size(self.blur_size)
    }
}

/// Gradient direction folded into four bins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Gradient along x; neighbors are left and right.
    Deg0,
    /// Gradient along the down-right diagonal (y grows downward).
    Deg45,
    /// Gradient along y; neighbors are above and below.
    Deg90,
    /// Gradient along the up-right diagonal.
    Deg135,
}

impl Direction {
    /// Quantizes a gradient vector.
    pub fn from_gradient(gx: f32, gy: f32) -> Self {
        let ax = gx.abs();
        let ay = gy.abs();
        if ay <= ax * TAN_22_5_DEG {
            Direction::Deg0
        } else if ax <= ay * TAN_22_5_DEG {
            Direction::Deg90
        } else if (gx > 0.0) == (gy > 0.0) {
            Direction::Deg45
        } else {
            Direction::Deg135
        }
    }

    /// Unit step toward the positive side of the gradient.
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Deg0 => (1, 0),
            Direction::Deg45 => (1, 1),
            Direction::Deg90 => (0, 1),
            Direction::Deg135 => (1, -1),
        }
    }
}

/// Runs the full Canny pipeline. Color input is converted to gray first.
pub fn canny(src: &RasterU8, cfg: &CannyConfig) -> RasterResult<RasterU8> {
    cfg.validate()?;
    let _span = trace_span!("canny", low = cfg.low, high = cfg.high).entered();

    let gray = to_gray(src);
    let smoothed = gaussian_smooth(&gray, cfg.blur_size, cfg.sigma)?;
    let (gx, gy) = gradients(&smoothed, GradientKernel::Sobel)?;
    let mag = magnitude(&gx, &gy)?;
    let thin = non_max_suppression(&mag, &gx, &gy)?;
    let edges = hysteresis(&thin, cfg.low, cfg.high)?;

    trace_event!(
        "canny_edges",
        count = edges.data().iter().filter(|&&v| v != 0).count()
    );
    Ok(edges)
}

/// Zeroes every magnitude that is not a local maximum along its quantized
/// gradient direction.
///
/// A pixel survives when it is strictly greater than the neighbor on the
/// negative side and not smaller than the neighbor on the positive side, so
/// flat-topped ridges collapse to a single pixel. Neighbors outside the
/// raster count as zero.
pub fn non_max_suppression(
    mag: &RasterF32,
    gx: &RasterF32,
    gy: &RasterF32,
) -> RasterResult<RasterF32> {
    if mag.channels() != Channels::Gray {
        return Err(RasterError::unsupported("magnitude", "expected a single-channel raster"));
    }
    let w = mag.width();
    let h = mag.height();
    for other in [gx, gy] {
        if other.width() != w || other.height() != h || other.channels() != Channels::Gray {
            return Err(RasterError::InvalidInput {
                reason: "gradient components differ in shape from the magnitude",
            });
        }
    }

    let m = mag.data();
    let at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= w as isize || y >= h as isize {
            0.0
        } else {
            m[y as usize * w + x as usize]
        }
    };

    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let value = m[idx];
            if value <= 0.0 {
                continue;
            }
            let (dx, dy) = Direction::from_gradient(gx.data()[idx], gy.data()[idx]).step();
            let (xi, yi) = (x as isize, y as isize);
            let n_neg = at(xi - dx, yi - dy);
            let n_pos = at(xi + dx, yi + dy);
            if value > n_neg && value >= n_pos {
                out[idx] = value;
            }
        }
    }
    Ok(RasterF32::from_parts(out, w, h, Channels::Gray))
}

/// Two-cutoff edge retention.
///
/// Pixels above `high` are strong; pixels above `low` are kept only when
/// 8-connected, directly or through other kept pixels, to a strong pixel.
pub fn hysteresis(thin: &RasterF32, low: f32, high: f32) -> RasterResult<RasterU8> {
    if thin.channels() != Channels::Gray {
        return Err(RasterError::unsupported("magnitude", "expected a single-channel raster"));
    }
    if high < low {
        return Err(RasterError::unsupported(
            "high",
            "high cutoff must not be below the low cutoff",
        ));
    }
    let w = thin.width();
    let h = thin.height();
    let m = thin.data();
    let mut out = vec![0u8; w * h];
    let mut stack = Vec::new();

    for (idx, &v) in m.iter().enumerate() {
        if v > high && out[idx] == 0 {
            out[idx] = 255;
            stack.push(idx);
            while let Some(cur) = stack.pop() {
                let cx = (cur % w) as isize;
                let cy = (cur / w) as isize;
                for ny in cy - 1..=cy + 1 {
                    for nx in cx - 1..=cx + 1 {
                        if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                            continue;
                        }
                        let n = ny as usize * w + nx as usize;
                        if out[n] == 0 && m[n] > low {
                            out[n] = 255;
                            stack.push(n);
                        }
                    }
                }
            }
        }
    }
    Ok(RasterU8::from_parts(out, w, h, Channels::Gray))
}
