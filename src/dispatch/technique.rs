//! Technique names.

use std::fmt;
use std::str::FromStr;

use crate::util::RasterError;

/// The analysis techniques the dispatcher can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Technique {
    Thresholding,
    Blur,
    EdgeDetection,
    Contours,
    TemplateMatching,
    Watershed,
    ColorSpace,
    Geometric,
}

impl Technique {
    pub const ALL: [Technique; 8] = [
        Technique::Thresholding,
        Technique::Blur,
        Technique::EdgeDetection,
        Technique::Contours,
        Technique::TemplateMatching,
        Technique::Watershed,
        Technique::ColorSpace,
        Technique::Geometric,
    ];

    /// Name shown to users; parses back to the same technique.
    pub fn display_name(self) -> &'static str {
        match self {
            Technique::Thresholding => "Thresholding",
            Technique::Blur => "Blur/Smoothing",
            Technique::EdgeDetection => "Edge-Detection",
            Technique::Contours => "Contours",
            Technique::TemplateMatching => "Template-Matching",
            Technique::Watershed => "Watershed-Segmentation",
            Technique::ColorSpace => "Color-Space-Conversion",
            Technique::Geometric => "Geometric/Photometric",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lowercases and drops separators so `Edge-Detection`, `edge detection`
/// and `edge_detection` compare equal.
pub(crate) fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for Technique {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let technique = match normalize_name(s).as_str() {
            "thresholding" | "threshold" => Technique::Thresholding,
            "blursmoothing" | "blur" | "smoothing" => Technique::Blur,
            "edgedetection" | "edges" | "edge" => Technique::EdgeDetection,
            "contours" | "contour" => Technique::Contours,
            "templatematching" | "template" | "matching" => Technique::TemplateMatching,
            "watershedsegmentation" | "watershed" | "segmentation" => Technique::Watershed,
            "colorspaceconversion" | "colorspace" | "color" => Technique::ColorSpace,
            "geometricphotometric" | "geometric" | "geometry" | "photometric" => {
                Technique::Geometric
            }
            _ => {
                return Err(RasterError::UnknownTechnique {
                    name: s.to_string(),
                })
            }
        };
        Ok(technique)
    }
}
