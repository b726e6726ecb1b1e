//! Utility functions for image loading and conversion.
//!
//! This module reads line images from disk and converts between `image` buffers and
//! the `ndarray` grids the pipeline works on.

use crate::core::OCRError;
use image::{DynamicImage, GrayImage, ImageBuffer};
use ndarray::Array2;
use std::path::Path;

/// Loads an image from a file path.
///
/// With `grayscale` set the image is converted to 8-bit luma; otherwise it is returned
/// in its stored color type.
///
/// # Errors
///
/// Returns `OCRError::ImageLoad` if the file cannot be opened or decoded.
pub fn read_image(path: &Path, grayscale: bool) -> Result<DynamicImage, OCRError> {
    let img = image::open(path).map_err(OCRError::ImageLoad)?;
    if grayscale {
        Ok(DynamicImage::ImageLuma8(img.to_luma8()))
    } else {
        Ok(img)
    }
}

/// Builds a GrayImage from a `(height, width)` grid.
///
/// Returns `None` if the grid is too large for image dimensions.
pub fn array_to_gray(pixels: &Array2<u8>) -> Option<GrayImage> {
    let (height, width) = pixels.dim();
    let data: Vec<u8> = pixels.iter().copied().collect();
    ImageBuffer::from_raw(u32::try_from(width).ok()?, u32::try_from(height).ok()?, data)
}
