//! Square convolution kernels.

use crate::util::math::is_odd_in_range;
use crate::util::{RasterError, RasterResult};

/// Largest kernel or window size accepted by the filters.
pub const MAX_KERNEL_SIZE: usize = 31;

/// Square, odd-sized kernel of real weights.
///
/// The weight for offset `(dx, dy)` (each in `[-r, r]`, `r = size / 2`) is
/// stored at `(dy + r) * size + (dx + r)`. Kernels are applied as a
/// correlation: offset `(1, 0)` weighs the pixel to the right.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f32>,
}

impl Kernel {
    /// Creates a kernel from row-major weights.
    pub fn new(size: usize, weights: Vec<f32>) -> RasterResult<Self> {
        validate_size(size)?;
        if weights.len() != size * size {
            return Err(RasterError::unsupported(
                "kernel",
                "weight count must equal size * size",
            ));
        }
        Ok(Self { size, weights })
    }

    pub(crate) fn from_fixed3(weights: &[f32; 9]) -> Self {
        Self {
            size: 3,
            weights: weights.to_vec(),
        }
    }

    /// Uniform averaging kernel.
    pub fn box_filter(size: usize) -> RasterResult<Self> {
        validate_size(size)?;
        let w = 1.0 / (size * size) as f32;
        Ok(Self {
            size,
            weights: vec![w; size * size],
        })
    }

    /// Gaussian kernel; `sigma` defaults to [`default_sigma`].
    pub fn gaussian(size: usize, sigma: Option<f32>) -> RasterResult<Self> {
        let g = gaussian_weights(size, sigma)?;
        let mut weights = Vec::with_capacity(size * size);
        for wy in &g {
            for wx in &g {
                weights.push(wy * wx);
            }
        }
        Ok(Self { size, weights })
    }

    /// Multiplies every weight by `factor`.
    pub fn scaled(mut self, factor: f32) -> Self {
        for w in &mut self.weights {
            *w *= factor;
        }
        self
    }

    /// Rescales the weights so they sum to one. Zero-sum kernels (derivative
    /// kernels) are returned unchanged.
    pub fn normalized(self) -> Self {
        let sum: f32 = self.weights.iter().sum();
        if sum.abs() <= f32::EPSILON {
            return self;
        }
        self.scaled(1.0 / sum)
    }

    /// Returns the side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `size / 2`.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Returns the row-major weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Returns the weight at offset `(dx, dy)` from the center.
    pub fn weight(&self, dx: isize, dy: isize) -> Option<f32> {
        let r = self.radius() as isize;
        if dx.abs() > r || dy.abs() > r {
            return None;
        }
        let idx = (dy + r) as usize * self.size + (dx + r) as usize;
        self.weights.get(idx).copied()
    }
}

/// Sigma used when none is supplied: `0.3 * ((size - 1) / 2 - 1) + 0.8`.
///
/// Size 1 yields 0.5, which still produces the single weight 1.
pub fn default_sigma(size: usize) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian weights of odd length `size`.
pub fn gaussian_weights(size: usize, sigma: Option<f32>) -> RasterResult<Vec<f32>> {
    validate_size(size)?;
    let sigma = match sigma {
        Some(s) if s.is_finite() && s > 0.0 => s,
        Some(_) => {
            return Err(RasterError::unsupported(
                "sigma",
                "must be finite and positive",
            ))
        }
        None => default_sigma(size),
    };
    let r = (size / 2) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-r..=r)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    Ok(weights)
}

pub(crate) fn validate_size(size: usize) -> RasterResult<()> {
    if !is_odd_in_range(size, 1, MAX_KERNEL_SIZE) {
        return Err(RasterError::unsupported(
            "kernel_size",
            "must be odd and between 1 and 31",
        ));
    }
    Ok(())
}
