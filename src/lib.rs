//! rasterlab is a CPU raster image-analysis engine.
//!
//! It implements classical techniques from first principles: thresholding
//! (fixed, Otsu, adaptive), convolution smoothing, gradient and Canny edges,
//! border following with hierarchy, template matching, marker-based watershed
//! segmentation, color conversion, and resizing. [`dispatch::run`] selects
//! one technique by name and returns the processed raster next to the
//! original.
//!
//! Optional features: `rayon` computes output rows in parallel, `image-io`
//! adds conversions to and from the `image` crate, `tracing` emits spans and
//! events.

pub mod color;
pub mod contour;
pub mod dispatch;
pub mod draw;
pub mod edge;
pub mod filter;
pub mod geometry;
pub mod image;
pub mod matching;
pub mod segment;
pub mod threshold;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use crate::contour::{find_contours, BorderKind, Contour, ContourSet, Point, RetrievalMode};
pub use crate::dispatch::{run, run_technique, Outcome, Overlay, Params, Technique};
pub use crate::edge::CannyConfig;
pub use crate::filter::{GradientKernel, Kernel};
pub use crate::image::{Channels, ElementType, Raster, RasterF32, RasterU8, Rect, Sample};
pub use crate::matching::{MatchMethod, MatchResult};
pub use crate::segment::{Elevation, MarkerMap, Warning, WatershedConfig, WatershedOutput};
pub use crate::threshold::ThresholdType;
pub use crate::util::{RasterError, RasterResult};
