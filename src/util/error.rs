//! Error types for rasterlab.

use thiserror::Error;

/// Result alias for rasterlab operations.
pub type RasterResult<T> = std::result::Result<T, RasterError>;

/// Errors that can occur when validating inputs or running a technique.
///
/// Every variant is raised before any pixel is processed; the engine is
/// deterministic, so retrying with the same arguments reproduces the error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RasterError {
    /// The buffer is empty, has a zero dimension, or its length disagrees
    /// with `width * height * channels`.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: &'static str },
    /// A parameter lies outside the domain declared by its technique.
    #[error("unsupported parameter `{name}`: {reason}")]
    UnsupportedParameter {
        name: &'static str,
        reason: &'static str,
    },
    /// The technique name is not one of the known techniques.
    #[error("unknown technique: {name}")]
    UnknownTechnique { name: String },
    /// The template exceeds the source raster in at least one dimension.
    #[error(
        "template {tpl_width}x{tpl_height} does not fit inside source {img_width}x{img_height}"
    )]
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Image decoding or encoding failed (`image-io` feature).
    #[cfg(feature = "image-io")]
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}

impl RasterError {
    pub(crate) fn unsupported(name: &'static str, reason: &'static str) -> Self {
        Self::UnsupportedParameter { name, reason }
    }
}
