//! Line images and the sources they are built from.

use crate::core::{OCRError, OcrResult};
use image::{DynamicImage, GrayImage};
use ndarray::{Array2, ArrayView2};
use std::path::{Path, PathBuf};

/// Where the pixels of a line come from.
///
/// The predictor dispatches on this once, at entry; every later stage works on a
/// normalized [`LineImage`].
#[derive(Debug, Clone)]
pub enum LineSource {
    /// An image file on disk.
    Path(PathBuf),
    /// An already decoded image of any color type.
    Image(DynamicImage),
    /// 8-bit grayscale pixels, indexed `[row, column]`.
    Gray8(Array2<u8>),
    /// Floating point grayscale pixels in `[0, 1]`, indexed `[row, column]`.
    ///
    /// Grids whose maximum exceeds 1 are taken to be on the 8-bit scale.
    Gray32F(Array2<f32>),
}

impl LineSource {
    /// Short description used in logs.
    pub fn describe(&self) -> String {
        match self {
            LineSource::Path(path) => format!("path {}", path.display()),
            LineSource::Image(img) => format!("image {}x{}", img.width(), img.height()),
            LineSource::Gray8(pixels) => format!("u8 pixels {:?}", pixels.dim()),
            LineSource::Gray32F(pixels) => format!("f32 pixels {:?}", pixels.dim()),
        }
    }
}

impl From<PathBuf> for LineSource {
    fn from(path: PathBuf) -> Self {
        LineSource::Path(path)
    }
}

impl From<&Path> for LineSource {
    fn from(path: &Path) -> Self {
        LineSource::Path(path.to_path_buf())
    }
}

impl From<&str> for LineSource {
    fn from(path: &str) -> Self {
        LineSource::Path(PathBuf::from(path))
    }
}

impl From<String> for LineSource {
    fn from(path: String) -> Self {
        LineSource::Path(PathBuf::from(path))
    }
}

impl From<DynamicImage> for LineSource {
    fn from(img: DynamicImage) -> Self {
        LineSource::Image(img)
    }
}

impl From<GrayImage> for LineSource {
    fn from(img: GrayImage) -> Self {
        LineSource::Image(DynamicImage::ImageLuma8(img))
    }
}

impl From<Array2<u8>> for LineSource {
    fn from(pixels: Array2<u8>) -> Self {
        LineSource::Gray8(pixels)
    }
}

impl From<Array2<f32>> for LineSource {
    fn from(pixels: Array2<f32>) -> Self {
        LineSource::Gray32F(pixels)
    }
}

/// A normalized grayscale line, ready for the model.
///
/// Pixels are in `[0, 1]` and indexed `[row, column]`. Columns past
/// [`content_width`](Self::content_width) are padding.
#[derive(Debug, Clone, PartialEq)]
pub struct LineImage {
    pixels: Array2<f32>,
    content_width: usize,
}

impl LineImage {
    /// Wraps normalized pixels.
    ///
    /// # Errors
    ///
    /// Returns an input error for empty grids, non-finite pixels, or a content width
    /// larger than the grid.
    pub fn new(pixels: Array2<f32>, content_width: usize) -> OcrResult<Self> {
        let (height, width) = pixels.dim();
        if height == 0 || width == 0 {
            return Err(OCRError::invalid_input(format!(
                "line image must be non-empty, got {height}x{width}"
            )));
        }
        if content_width > width {
            return Err(OCRError::invalid_input(format!(
                "content width {content_width} exceeds image width {width}"
            )));
        }
        if pixels.iter().any(|v| !v.is_finite()) {
            return Err(OCRError::invalid_input(
                "line image contains non-finite pixel values",
            ));
        }
        Ok(Self {
            pixels,
            content_width,
        })
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    /// Number of leading columns that carry source pixels.
    pub fn content_width(&self) -> usize {
        self.content_width
    }

    pub fn pixels(&self) -> ArrayView2<'_, f32> {
        self.pixels.view()
    }

    pub fn into_pixels(self) -> Array2<f32> {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCategory;

    #[test]
    fn test_line_image_rejects_empty() {
        let err = LineImage::new(Array2::zeros((28, 0)), 0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_line_image_rejects_non_finite() {
        let mut pixels = Array2::zeros((2, 2));
        pixels[[1, 1]] = f32::NAN;
        assert!(LineImage::new(pixels, 2).is_err());
    }

    #[test]
    fn test_line_image_keeps_content_width() {
        let image = LineImage::new(Array2::zeros((2, 4)), 2).unwrap();
        assert_eq!(image.height(), 2);
        assert_eq!(image.width(), 4);
        assert_eq!(image.content_width(), 2);
        assert!(LineImage::new(Array2::zeros((2, 4)), 5).is_err());
    }

    #[test]
    fn test_line_source_conversions() {
        assert!(matches!(LineSource::from("a.png"), LineSource::Path(_)));
        assert!(matches!(
            LineSource::from(Array2::<u8>::zeros((1, 1))),
            LineSource::Gray8(_)
        ));
        assert!(matches!(
            LineSource::from(GrayImage::new(3, 3)),
            LineSource::Image(_)
        ));
    }
}
