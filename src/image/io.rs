//! Conversions between rasters and the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{Channels, RasterU8};
use crate::util::{RasterError, RasterResult};
use std::path::Path;

/// Creates a single-channel raster from a grayscale image buffer.
pub fn raster_from_gray_image(img: &image::GrayImage) -> RasterResult<RasterU8> {
    RasterU8::gray(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Creates a three-channel raster from an RGB image buffer.
pub fn raster_from_rgb_image(img: &image::RgbImage) -> RasterResult<RasterU8> {
    RasterU8::rgb(img.as_raw().clone(), img.width() as usize, img.height() as usize)
}

/// Decodes a dynamic image, keeping grayscale sources single-channel and
/// converting everything else to RGB (alpha is dropped).
pub fn raster_from_dynamic_image(img: &image::DynamicImage) -> RasterResult<RasterU8> {
    match img {
        image::DynamicImage::ImageLuma8(gray) => raster_from_gray_image(gray),
        other if !other.color().has_color() => raster_from_gray_image(&other.to_luma8()),
        other => raster_from_rgb_image(&other.to_rgb8()),
    }
}

/// Converts a raster back into a dynamic image for encoding.
pub fn raster_to_dynamic_image(raster: &RasterU8) -> RasterResult<image::DynamicImage> {
    let width = u32::try_from(raster.width()).map_err(|_| RasterError::InvalidInput {
        reason: "raster too wide to encode",
    })?;
    let height = u32::try_from(raster.height()).map_err(|_| RasterError::InvalidInput {
        reason: "raster too tall to encode",
    })?;
    let data = raster.data().to_vec();
    let img = match raster.channels() {
        Channels::Gray => image::GrayImage::from_raw(width, height, data)
            .map(image::DynamicImage::ImageLuma8),
        Channels::Rgb => {
            image::RgbImage::from_raw(width, height, data).map(image::DynamicImage::ImageRgb8)
        }
    };
    img.ok_or(RasterError::InvalidInput {
        reason: "raster buffer does not match image dimensions",
    })
}

/// Loads and decodes an image from disk.
pub fn load_raster<P: AsRef<Path>>(path: P) -> RasterResult<RasterU8> {
    let img = image::open(path).map_err(|err| RasterError::ImageIo {
        reason: err.to_string(),
    })?;
    raster_from_dynamic_image(&img)
}

/// Encodes a raster to disk; the format follows the file extension.
pub fn save_raster<P: AsRef<Path>>(raster: &RasterU8, path: P) -> RasterResult<()> {
    raster_to_dynamic_image(raster)?
        .save(path)
        .map_err(|err| RasterError::ImageIo {
            reason: err.to_string(),
        })
}
