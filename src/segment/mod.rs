//! Marker-based watershed segmentation.
//!
//! The pipeline separates touching foreground objects:
//!
//! 1. binarize at the Otsu cutoff (inverted, so dark objects become
//!    foreground),
//! 2. open to remove specks,
//! 3. dilate to get the sure background,
//! 4. distance transform; pixels beyond `foreground_ratio * max` are sure
//!    foreground,
//! 5. the ring between the two is unknown,
//! 6. label sure-foreground components as seeds,
//! 7. flood the unknown ring over the elevation map.
//!
//! Every stage is kept in [`WatershedStages`] for inspection.

mod distance;
mod label;
mod morphology;
mod watershed;

pub use distance::distance_transform;
pub use label::label_components;
pub use morphology::{dilate, erode, open};
pub use watershed::{flood, MarkerMap};

use std::fmt;
use std::str::FromStr;

use crate::color::{gray_to_rgb, to_gray};
use crate::draw::paint_boundaries;
use crate::edge::gradient_edges;
use crate::filter::GradientKernel;
use crate::image::{Channels, RasterF32, RasterU8};
use crate::threshold::{otsu, ThresholdType};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{RasterError, RasterResult};

/// Largest accepted erosion/dilation repeat count.
pub const MAX_ITERATIONS: usize = 64;

/// Surface the flood climbs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Elevation {
    /// Sobel gradient magnitude of the gray image.
    #[default]
    Gradient,
    /// Gray intensity.
    Intensity,
}

impl FromStr for Elevation {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gradient" | "sobel" => Ok(Elevation::Gradient),
            "intensity" | "gray" | "grey" => Ok(Elevation::Intensity),
            _ => Err(RasterError::unsupported("elevation", "unknown elevation source")),
        }
    }
}

/// Watershed parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct WatershedConfig {
    /// Side of the square structuring element (odd).
    pub kernel_size: usize,
    /// Erosions, then dilations, in the opening step.
    pub open_iterations: usize,
    /// Dilations producing the sure background.
    pub dilate_iterations: usize,
    /// Fraction of the peak distance above which pixels are sure foreground.
    pub foreground_ratio: f32,
    pub elevation: Elevation,
    /// RGB color painted on boundary pixels.
    pub boundary_color: [u8; 3],
}

impl Default for WatershedConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            open_iterations: 2,
            dilate_iterations: 3,
            foreground_ratio: 0.7,
            elevation: Elevation::Gradient,
            boundary_color: [255, 0, 0],
        }
    }
}

impl WatershedConfig {
    pub fn validate(&self) -> RasterResult<()> {
        crate::filter::kernel::validate_size(self.kernel_size)?;
        if self.open_iterations > MAX_ITERATIONS {
            return Err(RasterError::unsupported("open_iterations", "must be at most 64"));
        }
        if self.dilate_iterations > MAX_ITERATIONS {
            return Err(RasterError::unsupported("dilate_iterations", "must be at most 64"));
        }
        if !(self.foreground_ratio > 0.0 && self.foreground_ratio < 1.0) {
            return Err(RasterError::unsupported(
                "foreground_ratio",
                "must lie strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// Non-fatal conditions reported alongside a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Warning {
    /// No sure-foreground region was found; the input is returned unchanged.
    NoSeparableRegions,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::NoSeparableRegions => f.write_str("no separable regions found"),
        }
    }
}

/// Intermediate rasters of one segmentation run.
#[derive(Clone, Debug, PartialEq)]
pub struct WatershedStages {
    pub otsu_level: u8,
    pub binary: RasterU8,
    pub opened: RasterU8,
    pub sure_background: RasterU8,
    pub distance: RasterF32,
    pub sure_foreground: RasterU8,
    pub unknown: RasterU8,
}

/// Result of [`segment`].
#[derive(Clone, Debug, PartialEq)]
pub struct WatershedOutput {
    /// RGB copy of the input with boundary pixels recolored, or the input
    /// itself when no regions were found.
    pub processed: RasterU8,
    /// Final labels; `None` when no seeds were found.
    pub markers: Option<MarkerMap>,
    pub stages: WatershedStages,
    pub warning: Option<Warning>,
}

/// Runs the full watershed pipeline.
pub fn segment(src: &RasterU8, cfg: &WatershedConfig) -> RasterResult<WatershedOutput> {
    cfg.validate()?;
    let _span = trace_span!("watershed", width = src.width(), height = src.height()).entered();

    let gray = to_gray(src);
    let (otsu_level, binary) = otsu(&gray, 255, ThresholdType::BinaryInv)?;
    trace_event!("otsu_level", level = otsu_level);

    let opened = open(&binary, cfg.kernel_size, cfg.open_iterations)?;
    let sure_background = dilate(&opened, cfg.kernel_size, cfg.dilate_iterations)?;
    let distance = distance_transform(&opened)?;

    let peak = distance
        .data()
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0f32, f32::max);
    let cutoff = cfg.foreground_ratio * peak;
    let sure_foreground = distance.map(|d| if d.is_finite() && d > cutoff { 255u8 } else { 0 });
    let unknown_data = sure_background
        .data()
        .iter()
        .zip(sure_foreground.data())
        .map(|(&bg, &fg)| if bg != 0 && fg == 0 { 255u8 } else { 0 })
        .collect();
    let unknown = RasterU8::from_parts(unknown_data, src.width(), src.height(), Channels::Gray);

    let (mut labels, seeds) = label_components(&sure_foreground)?;
    trace_event!("watershed_seeds", count = seeds);

    let stages = WatershedStages {
        otsu_level,
        binary,
        opened,
        sure_background,
        distance,
        sure_foreground,
        unknown,
    };

    if seeds == 0 {
        trace_warn!("watershed_degenerate", otsu_level = otsu_level);
        return Ok(WatershedOutput {
            processed: src.clone(),
            markers: None,
            stages,
            warning: Some(Warning::NoSeparableRegions),
        });
    }

    for (label, &u) in labels.iter_mut().zip(stages.unknown.data()) {
        *label = if u != 0 { MarkerMap::UNKNOWN } else { *label + 1 };
    }
    let mut markers = MarkerMap::new(labels, src.width(), src.height())?;

    let elevation = match cfg.elevation {
        Elevation::Gradient => gradient_edges(&gray, GradientKernel::Sobel)?,
        Elevation::Intensity => gray,
    };
    flood(&mut markers, &elevation)?;
    trace_event!("watershed_boundaries", count = markers.boundary_count());

    let processed = paint_boundaries(&gray_to_rgb(src), &markers, cfg.boundary_color)?;
    Ok(WatershedOutput {
        processed,
        markers: Some(markers),
        stages,
        warning: None,
    })
}
