//! Technique dispatch.
//!
//! A collaborator names one technique and supplies its parameter set;
//! [`run`] validates both and executes exactly one component, returning the
//! processed raster next to the original plus any overlay metadata.

mod params;
mod technique;

pub use params::{
    BlurMethod, BlurParams, ColorSpace, ColorSpaceParams, ContourParams, EdgeMethod, EdgeParams,
    GeometricParams, Params, TemplateParams, ThresholdMethod, ThresholdParams, MAX_THICKNESS,
};
pub use technique::Technique;

use crate::color::{gray_to_rgb, hsv_to_display, rgb_to_hsv, swap_rb, to_gray};
use crate::contour::{find_contours, ContourSet};
use crate::draw::{draw_contours, draw_rect};
use crate::edge::{canny, gradient_edges};
use crate::filter::{box_blur, gaussian_blur, median_blur, GradientKernel};
use crate::geometry::{adjust, resize_percent};
use crate::image::{Channels, RasterU8};
use crate::matching::{find_template, MatchResult};
use crate::segment::{segment, MarkerMap, Warning};
use crate::threshold::{adaptive_mean, otsu, threshold, ThresholdType};
use crate::trace::{trace_event, trace_span};
use crate::util::{RasterError, RasterResult};

/// Metadata describing what a technique found.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Contours(ContourSet),
    Match(MatchResult),
    Markers(MarkerMap),
}

/// Result of one dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub original: RasterU8,
    pub processed: RasterU8,
    pub overlay: Option<Overlay>,
    pub warnings: Vec<Warning>,
}

/// Parses `technique` and runs it on `src`.
pub fn run(src: &RasterU8, technique: &str, params: Params) -> RasterResult<Outcome> {
    run_technique(src, technique.parse()?, params)
}

/// Runs `technique` on `src` with `params`.
///
/// Fails with `UnsupportedParameter` when `params` belongs to another
/// technique or holds an out-of-domain value. Single-channel techniques
/// convert color input to gray first.
pub fn run_technique(src: &RasterU8, technique: Technique, params: Params) -> RasterResult<Outcome> {
    if params.technique() != technique {
        return Err(RasterError::unsupported(
            "params",
            "parameter set belongs to a different technique",
        ));
    }
    params.validate()?;
    let _span = trace_span!(
        "dispatch",
        technique = technique.display_name(),
        width = src.width(),
        height = src.height()
    )
    .entered();

    let mut warnings = Vec::new();
    let (processed, overlay) = match params {
        Params::Threshold(p) => (run_threshold(src, &p)?, None),
        Params::Blur(p) => (run_blur(src, &p)?, None),
        Params::Edge(p) => (run_edges(src, &p)?, None),
        Params::Contours(p) => {
            let (painted, set) = run_contours(src, &p)?;
            (painted, Some(Overlay::Contours(set)))
        }
        Params::TemplateMatching(p) => {
            let (painted, best) = run_template(src, &p)?;
            (painted, Some(Overlay::Match(best)))
        }
        Params::Watershed(cfg) => {
            let out = segment(src, &cfg)?;
            warnings.extend(out.warning);
            (out.processed, out.markers.map(Overlay::Markers))
        }
        Params::ColorSpace(p) => (run_color(src, &p)?, None),
        Params::Geometric(p) => {
            let resized = resize_percent(src, p.scale_percent)?;
            (adjust(&resized, p.alpha, p.beta)?, None)
        }
    };

    trace_event!(
        "dispatch_done",
        out_width = processed.width(),
        out_height = processed.height(),
        warnings = warnings.len()
    );
    Ok(Outcome {
        original: src.clone(),
        processed,
        overlay,
        warnings,
    })
}

fn run_threshold(src: &RasterU8, p: &ThresholdParams) -> RasterResult<RasterU8> {
    let gray = to_gray(src);
    match p.method {
        ThresholdMethod::Otsu => {
            let (level, out) = otsu(&gray, p.max_value, ThresholdType::Binary)?;
            trace_event!("otsu_level", level = level);
            Ok(out)
        }
        ThresholdMethod::AdaptiveMean => adaptive_mean(&gray, p.max_value, p.block_size, p.c),
        ThresholdMethod::Binary => threshold(&gray, p.cutoff, p.max_value, ThresholdType::Binary),
        ThresholdMethod::BinaryInv => {
            threshold(&gray, p.cutoff, p.max_value, ThresholdType::BinaryInv)
        }
        ThresholdMethod::Truncate => {
            threshold(&gray, p.cutoff, p.max_value, ThresholdType::Truncate)
        }
        ThresholdMethod::ToZero => threshold(&gray, p.cutoff, p.max_value, ThresholdType::ToZero),
        ThresholdMethod::ToZeroInv => {
            threshold(&gray, p.cutoff, p.max_value, ThresholdType::ToZeroInv)
        }
    }
}

fn run_blur(src: &RasterU8, p: &BlurParams) -> RasterResult<RasterU8> {
    match p.method {
        BlurMethod::Box => box_blur(src, p.kernel_size),
        BlurMethod::Gaussian => gaussian_blur(src, p.kernel_size, p.sigma),
        BlurMethod::Median => median_blur(src, p.kernel_size),
    }
}

fn run_edges(src: &RasterU8, p: &EdgeParams) -> RasterResult<RasterU8> {
    match p.method {
        EdgeMethod::Sobel => gradient_edges(src, GradientKernel::Sobel),
        EdgeMethod::Scharr => gradient_edges(src, GradientKernel::Scharr),
        EdgeMethod::Laplacian => gradient_edges(src, GradientKernel::Laplacian),
        EdgeMethod::Canny => canny(src, &p.canny),
    }
}

fn run_contours(src: &RasterU8, p: &ContourParams) -> RasterResult<(RasterU8, ContourSet)> {
    let gray = to_gray(src);
    let binary = match p.cutoff {
        Some(cutoff) => threshold(&gray, cutoff, 255, ThresholdType::Binary)?,
        None => otsu(&gray, 255, ThresholdType::Binary)?.1,
    };
    let set = find_contours(&binary, p.retrieval)?;
    Ok((draw_contours(src, &set, p.color, p.thickness), set))
}

fn run_template(src: &RasterU8, p: &TemplateParams) -> RasterResult<(RasterU8, MatchResult)> {
    let tpl = p
        .template
        .as_ref()
        .ok_or(RasterError::unsupported("template", "a template raster is required"))?;
    // Mixed layouts are compared in gray.
    let (_, best) = if tpl.channels() == src.channels() {
        find_template(src, tpl, p.method)?
    } else {
        find_template(&to_gray(src), &to_gray(tpl), p.method)?
    };
    Ok((draw_rect(src, best.bbox, p.color, p.thickness), best))
}

fn run_color(src: &RasterU8, p: &ColorSpaceParams) -> RasterResult<RasterU8> {
    match p.target {
        ColorSpace::Gray => Ok(to_gray(src)),
        ColorSpace::Hsv => hsv_to_display(&rgb_to_hsv(&gray_to_rgb(src))?),
        ColorSpace::Bgr => match src.channels() {
            Channels::Rgb => swap_rb(src),
            Channels::Gray => Ok(src.clone()),
        },
    }
}
