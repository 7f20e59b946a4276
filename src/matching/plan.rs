//! Template statistics precomputed once per match.

use crate::image::RasterU8;

/// Per-channel sums and the zero-mean template used by the correlation
/// metrics.
pub(crate) struct TemplatePlan {
    width: usize,
    height: usize,
    channels: usize,
    values: Vec<f64>,
    zero_mean: Vec<f64>,
    sum_sq: f64,
    zero_mean_sum_sq: f64,
}

impl TemplatePlan {
    pub(crate) fn new(tpl: &RasterU8) -> Self {
        let width = tpl.width();
        let height = tpl.height();
        let channels = tpl.channels().count();
        let count = (width * height) as f64;

        let mut sums = vec![0.0f64; channels];
        let mut sum_sq = 0.0f64;
        let values: Vec<f64> = tpl.data().iter().map(|&v| f64::from(v)).collect();
        for (i, &v) in values.iter().enumerate() {
            sums[i % channels] += v;
            sum_sq += v * v;
        }
        let means: Vec<f64> = sums.iter().map(|s| s / count).collect();

        let zero_mean: Vec<f64> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| v - means[i % channels])
            .collect();
        let zero_mean_sum_sq = zero_mean.iter().map(|v| v * v).sum();

        Self {
            width,
            height,
            channels,
            values,
            zero_mean,
            sum_sq,
            zero_mean_sum_sq,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn channels(&self) -> usize {
        self.channels
    }

    /// Template elements, row-major and interleaved.
    pub(crate) fn values(&self) -> &[f64] {
        &self.values
    }

    /// Template elements minus their channel mean.
    pub(crate) fn zero_mean(&self) -> &[f64] {
        &self.zero_mean
    }

    /// Sum of squared template elements over all channels.
    pub(crate) fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Sum of squared zero-mean elements over all channels.
    pub(crate) fn zero_mean_sum_sq(&self) -> f64 {
        self.zero_mean_sum_sq
    }
}
