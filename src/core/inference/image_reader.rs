//! Default implementation of the `ImageReader` trait.

use crate::core::{errors::OCRError, traits::ImageReader};
use image::DynamicImage;
use std::path::Path;

/// Reads images from disk with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultImageReader;

impl DefaultImageReader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageReader for DefaultImageReader {
    fn read_image(&self, path: &Path, grayscale: bool) -> Result<DynamicImage, OCRError> {
        crate::utils::read_image(path, grayscale)
    }
}
