//! Per-technique parameter sets and method selectors.
//!
//! Every parameter struct has a `Default` matching the interactive defaults
//! and a `validate` that rejects out-of-domain values before any pixel is
//! touched. Override fields with struct-update syntax.

use std::str::FromStr;

use super::technique::{normalize_name, Technique};
use crate::contour::RetrievalMode;
use crate::edge::CannyConfig;
use crate::filter::kernel::validate_size;
use crate::geometry::{MAX_SCALE_PERCENT, MIN_SCALE_PERCENT};
use crate::image::RasterU8;
use crate::matching::MatchMethod;
use crate::segment::WatershedConfig;
use crate::threshold::MAX_BLOCK_SIZE;
use crate::util::math::is_odd_in_range;
use crate::util::{RasterError, RasterResult};

/// Largest overlay line thickness.
pub const MAX_THICKNESS: usize = 10;

/// Thresholding rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ThresholdMethod {
    #[default]
    Binary,
    BinaryInv,
    Truncate,
    ToZero,
    ToZeroInv,
    AdaptiveMean,
    Otsu,
}

impl FromStr for ThresholdMethod {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "binary" => Ok(ThresholdMethod::Binary),
            "binaryinv" | "binaryinverse" | "binaryinverted" => Ok(ThresholdMethod::BinaryInv),
            "truncate" | "trunc" => Ok(ThresholdMethod::Truncate),
            "tozero" => Ok(ThresholdMethod::ToZero),
            "tozeroinv" | "tozeroinverse" => Ok(ThresholdMethod::ToZeroInv),
            "adaptivemean" | "adaptive" => Ok(ThresholdMethod::AdaptiveMean),
            "otsu" => Ok(ThresholdMethod::Otsu),
            _ => Err(RasterError::unsupported("method", "unknown threshold method")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdParams {
    pub method: ThresholdMethod,
    /// Fixed cutoff; ignored by Otsu and adaptive mean.
    pub cutoff: u8,
    pub max_value: u8,
    /// Adaptive neighborhood size (odd, at least 3).
    pub block_size: usize,
    /// Constant subtracted from the adaptive mean.
    pub c: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::Binary,
            cutoff: 127,
            max_value: 255,
            block_size: 11,
            c: 2.0,
        }
    }
}

impl ThresholdParams {
    pub fn validate(&self) -> RasterResult<()> {
        if self.method == ThresholdMethod::AdaptiveMean {
            if !is_odd_in_range(self.block_size, 3, MAX_BLOCK_SIZE) {
                return Err(RasterError::unsupported("block_size", "must be odd and at least 3"));
            }
            if !self.c.is_finite() {
                return Err(RasterError::unsupported("c", "must be finite"));
            }
        }
        Ok(())
    }
}

/// Smoothing filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlurMethod {
    Box,
    #[default]
    Gaussian,
    Median,
}

impl FromStr for BlurMethod {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "box" | "average" | "mean" => Ok(BlurMethod::Box),
            "gaussian" | "gauss" => Ok(BlurMethod::Gaussian),
            "median" => Ok(BlurMethod::Median),
            _ => Err(RasterError::unsupported("method", "unknown blur method")),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlurParams {
    pub method: BlurMethod,
    pub kernel_size: usize,
    /// Gaussian sigma; derived from the size when `None`.
    pub sigma: Option<f32>,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            method: BlurMethod::Gaussian,
            kernel_size: 5,
            sigma: None,
        }
    }
}

impl BlurParams {
    pub fn validate(&self) -> RasterResult<()> {
        validate_size(self.kernel_size)?;
        if let Some(sigma) = self.sigma {
            if !sigma.is_finite() || sigma <= 0.0 {
                return Err(RasterError::unsupported("sigma", "must be finite and positive"));
            }
        }
        Ok(())
    }
}

/// Edge extractor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EdgeMethod {
    Sobel,
    Scharr,
    Laplacian,
    #[default]
    Canny,
}

impl FromStr for EdgeMethod {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "sobel" => Ok(EdgeMethod::Sobel),
            "scharr" => Ok(EdgeMethod::Scharr),
            "laplacian" | "laplace" => Ok(EdgeMethod::Laplacian),
            "canny" => Ok(EdgeMethod::Canny),
            _ => Err(RasterError::unsupported("method", "unknown edge method")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeParams {
    pub method: EdgeMethod,
    /// Used by [`EdgeMethod::Canny`] only.
    pub canny: CannyConfig,
}

impl EdgeParams {
    pub fn validate(&self) -> RasterResult<()> {
        match self.method {
            EdgeMethod::Canny => self.canny.validate(),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContourParams {
    pub retrieval: RetrievalMode,
    /// Binarization cutoff; Otsu when `None`.
    pub cutoff: Option<u8>,
    pub color: [u8; 3],
    pub thickness: usize,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            retrieval: RetrievalMode::Tree,
            cutoff: None,
            color: [0, 255, 0],
            thickness: 2,
        }
    }
}

impl ContourParams {
    pub fn validate(&self) -> RasterResult<()> {
        validate_thickness(self.thickness)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TemplateParams {
    /// Pattern to search for; required.
    pub template: Option<RasterU8>,
    pub method: MatchMethod,
    pub color: [u8; 3],
    pub thickness: usize,
}

impl Default for TemplateParams {
    fn default() -> Self {
        Self {
            template: None,
            method: MatchMethod::CCoeffNormed,
            color: [0, 255, 0],
            thickness: 2,
        }
    }
}

impl TemplateParams {
    /// Default parameters searching for `template`.
    pub fn with_template(template: RasterU8) -> Self {
        Self {
            template: Some(template),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> RasterResult<()> {
        if self.template.is_none() {
            return Err(RasterError::unsupported("template", "a template raster is required"));
        }
        validate_thickness(self.thickness)
    }
}

/// Conversion target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    #[default]
    Gray,
    Hsv,
    Bgr,
}

impl FromStr for ColorSpace {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "gray" | "grey" | "grayscale" | "greyscale" => Ok(ColorSpace::Gray),
            "hsv" => Ok(ColorSpace::Hsv),
            "bgr" | "rgb2bgr" => Ok(ColorSpace::Bgr),
            _ => Err(RasterError::unsupported("target", "unknown color space")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColorSpaceParams {
    pub target: ColorSpace,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeometricParams {
    /// Resize percentage in `[10, 200]`.
    pub scale_percent: f32,
    /// Contrast gain.
    pub alpha: f32,
    /// Brightness offset.
    pub beta: f32,
}

impl Default for GeometricParams {
    fn default() -> Self {
        Self {
            scale_percent: 100.0,
            alpha: 1.0,
            beta: 0.0,
        }
    }
}

impl GeometricParams {
    pub fn validate(&self) -> RasterResult<()> {
        let p = self.scale_percent;
        if !p.is_finite() || !(MIN_SCALE_PERCENT..=MAX_SCALE_PERCENT).contains(&p) {
            return Err(RasterError::unsupported(
                "scale_percent",
                "must be finite and within [10, 200]",
            ));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(RasterError::unsupported("alpha", "must be finite and positive"));
        }
        if !self.beta.is_finite() || !(-255.0..=255.0).contains(&self.beta) {
            return Err(RasterError::unsupported("beta", "must lie within [-255, 255]"));
        }
        Ok(())
    }
}

fn validate_thickness(thickness: usize) -> RasterResult<()> {
    if thickness == 0 || thickness > MAX_THICKNESS {
        return Err(RasterError::unsupported("thickness", "must be within [1, 10]"));
    }
    Ok(())
}

/// Parameter set for exactly one technique.
#[derive(Clone, Debug, PartialEq)]
pub enum Params {
    Threshold(ThresholdParams),
    Blur(BlurParams),
    Edge(EdgeParams),
    Contours(ContourParams),
    TemplateMatching(TemplateParams),
    Watershed(WatershedConfig),
    ColorSpace(ColorSpaceParams),
    Geometric(GeometricParams),
}

impl Params {
    /// Default parameters for `technique`.
    ///
    /// Template matching has no default template; supply one before running.
    pub fn defaults(technique: Technique) -> Self {
        match technique {
            Technique::Thresholding => Params::Threshold(ThresholdParams::default()),
            Technique::Blur => Params::Blur(BlurParams::default()),
            Technique::EdgeDetection => Params::Edge(EdgeParams::default()),
            Technique::Contours => Params::Contours(ContourParams::default()),
            Technique::TemplateMatching => Params::TemplateMatching(TemplateParams::default()),
            Technique::Watershed => Params::Watershed(WatershedConfig::default()),
            Technique::ColorSpace => Params::ColorSpace(ColorSpaceParams::default()),
            Technique::Geometric => Params::Geometric(GeometricParams::default()),
        }
    }

    /// The technique this parameter set belongs to.
    pub fn technique(&self) -> Technique {
        match self {
            Params::Threshold(_) => Technique::Thresholding,
            Params::Blur(_) => Technique::Blur,
            Params::Edge(_) => Technique::EdgeDetection,
            Params::Contours(_) => Technique::Contours,
            Params::TemplateMatching(_) => Technique::TemplateMatching,
            Params::Watershed(_) => Technique::Watershed,
            Params::ColorSpace(_) => Technique::ColorSpace,
            Params::Geometric(_) => Technique::Geometric,
        }
    }

    pub fn validate(&self) -> RasterResult<()> {
        match self {
            Params::Threshold(p) => p.validate(),
            Params::Blur(p) => p.validate(),
            Params::Edge(p) => p.validate(),
            Params::Contours(p) => p.validate(),
            Params::TemplateMatching(p) => p.validate(),
            Params::Watershed(p) => p.validate(),
            Params::ColorSpace(_) => Ok(()),
            Params::Geometric(p) => p.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BlurMethod, BlurParams, ColorSpace, EdgeMethod, GeometricParams, Params, ThresholdMethod,
        ThresholdParams,
    };
    use crate::dispatch::Technique;
    use crate::util::RasterError;

    #[test]
    fn defaults_belong_to_their_technique() {
        for t in Technique::ALL {
            assert_eq!(Params::defaults(t).technique(), t);
        }
    }

    #[test]
    fn selectors_parse_loosely_and_reject_unknown_names() {
        assert_eq!("Binary Inv".parse::<ThresholdMethod>().unwrap(), ThresholdMethod::BinaryInv);
        assert_eq!("adaptive_mean".parse::<ThresholdMethod>().unwrap(), ThresholdMethod::AdaptiveMean);
        assert_eq!("Median".parse::<BlurMethod>().unwrap(), BlurMethod::Median);
        assert_eq!("CANNY".parse::<EdgeMethod>().unwrap(), EdgeMethod::Canny);
        assert_eq!("hsv".parse::<ColorSpace>().unwrap(), ColorSpace::Hsv);
        assert!(matches!(
            "bilateral".parse::<BlurMethod>().unwrap_err(),
            RasterError::UnsupportedParameter { .. }
        ));
    }

    #[test]
    fn validation_rejects_out_of_domain_values() {
        let even = BlurParams {
            kernel_size: 4,
            ..BlurParams::default()
        };
        assert!(even.validate().is_err());

        let block = ThresholdParams {
            method: ThresholdMethod::AdaptiveMean,
            block_size: 1,
            ..ThresholdParams::default()
        };
        assert!(block.validate().is_err());

        let scale = GeometricParams {
            scale_percent: 500.0,
            ..GeometricParams::default()
        };
        assert!(scale.validate().is_err());

        assert!(Params::defaults(Technique::TemplateMatching).validate().is_err());
    }
}
