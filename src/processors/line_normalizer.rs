//! Line image normalization.
//!
//! This module turns arbitrary grayscale line images into the fixed-height grids a
//! line model consumes. Lines are scaled to the target height preserving their aspect
//! ratio, squeezed horizontally when they end up wider than the model allows, and
//! right-padded with the background value when the model expects a fixed width.

use crate::core::errors::SimpleError;
use crate::core::{DefaultImageReader, ImageReader, OCRError, OcrResult};
use crate::domain::{LineImage, LineSource, ModelInputSpec};
use image::{DynamicImage, ImageBuffer, Luma};
use ndarray::{Array2, s};
use tracing::{debug, warn};

/// Resizes and pads line images to a model's input geometry.
#[derive(Debug, Clone)]
pub struct LineNormalizer<R: ImageReader = DefaultImageReader> {
    target_height: usize,
    max_width: usize,
    pad_to_max_width: bool,
    invert: bool,
    background: f32,
    reader: R,
}

impl LineNormalizer<DefaultImageReader> {
    /// Creates a normalizer that scales to `target_height` and pads to `max_width`.
    pub fn new(target_height: usize, max_width: usize) -> Self {
        Self {
            target_height,
            max_width,
            pad_to_max_width: true,
            invert: false,
            background: 0.0,
            reader: DefaultImageReader::new(),
        }
    }

    /// Creates a normalizer matching a model's input contract.
    pub fn from_input_spec(spec: &ModelInputSpec) -> Self {
        Self::new(spec.height, spec.max_width)
            .with_padding(spec.fixed_width)
            .with_invert(spec.invert)
            .with_background(spec.background)
    }
}

impl<R: ImageReader> LineNormalizer<R> {
    /// Replaces the reader used for [`LineSource::Path`] sources.
    pub fn with_reader<R2: ImageReader>(self, reader: R2) -> LineNormalizer<R2> {
        LineNormalizer {
            target_height: self.target_height,
            max_width: self.max_width,
            pad_to_max_width: self.pad_to_max_width,
            invert: self.invert,
            background: self.background,
            reader,
        }
    }

    pub fn with_padding(mut self, pad_to_max_width: bool) -> Self {
        self.pad_to_max_width = pad_to_max_width;
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    pub fn with_background(mut self, background: f32) -> Self {
        self.background = background.clamp(0.0, 1.0);
        self
    }

    pub fn target_height(&self) -> usize {
        self.target_height
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Loads a line from any source and normalizes it.
    ///
    /// # Errors
    ///
    /// Returns an input error when the source cannot be read, has a zero dimension,
    /// or holds non-finite pixels.
    pub fn normalize(&self, source: &LineSource, grayscale: bool) -> OcrResult<LineImage> {
        let pixels = match source {
            LineSource::Path(path) => {
                let img = self.reader.read_image(path, grayscale)?;
                luma_to_unit(&img)?
            }
            LineSource::Image(img) => luma_to_unit(img)?,
            LineSource::Gray8(pixels) => pixels.mapv(|v| f32::from(v) / 255.0),
            LineSource::Gray32F(pixels) => float_to_unit(pixels)?,
        };
        self.normalize_pixels(pixels)
    }

    /// Normalizes a grid of pixels already in `[0, 1]`.
    pub fn normalize_pixels(&self, pixels: Array2<f32>) -> OcrResult<LineImage> {
        let (height, width) = pixels.dim();
        if height == 0 || width == 0 {
            return Err(OCRError::invalid_input(format!(
                "line image has a zero dimension: {height}x{width}"
            )));
        }
        if pixels.iter().any(|v| !v.is_finite()) {
            return Err(OCRError::invalid_input(
                "line image contains non-finite pixel values",
            ));
        }

        let pixels = if self.invert {
            pixels.mapv(|v| 1.0 - v)
        } else {
            pixels
        };

        let scale = self.target_height as f32 / height as f32;
        let natural_width = (width as f32 * scale).round() as usize;
        if natural_width > self.max_width {
            warn!(
                "line of width {} squeezed from {} to {} columns",
                width, natural_width, self.max_width
            );
        }
        let scaled_width = natural_width.clamp(1, self.max_width);
        let resized = if (height, width) == (self.target_height, scaled_width) {
            pixels
        } else {
            resize_gray(&pixels, self.target_height, scaled_width)?
        };

        debug!(
            "normalized {}x{} line to {}x{}",
            height, width, self.target_height, scaled_width
        );

        if !self.pad_to_max_width || scaled_width == self.max_width {
            return LineImage::new(resized, scaled_width);
        }

        let mut padded = Array2::from_elem((self.target_height, self.max_width), self.background);
        padded
            .slice_mut(s![.., ..scaled_width])
            .assign(&resized);
        LineImage::new(padded, scaled_width)
    }
}

/// Converts a decoded image to luma and maps it to `[0, 1]`.
fn luma_to_unit(img: &DynamicImage) -> OcrResult<Array2<f32>> {
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();
    let values: Vec<f32> = gray.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
    Ok(Array2::from_shape_vec((height as usize, width as usize), values)?)
}

/// Grids whose maximum exceeds this are on the 8-bit scale.
const BYTE_SCALE_THRESHOLD: f32 = 2.0;

/// Maps float pixels to `[0, 1]`.
///
/// Unit-scale grids are clamped, so interpolation overshoot slightly above 1 stays put.
fn float_to_unit(pixels: &Array2<f32>) -> OcrResult<Array2<f32>> {
    if pixels.iter().any(|v| !v.is_finite()) {
        return Err(OCRError::invalid_input(
            "line image contains non-finite pixel values",
        ));
    }
    let max = pixels.iter().copied().fold(0.0f32, f32::max);
    let divisor = if max > BYTE_SCALE_THRESHOLD { 255.0 } else { 1.0 };
    Ok(pixels.mapv(|v| (v / divisor).clamp(0.0, 1.0)))
}

/// Bilinear resize of a `[0, 1]` grid.
fn resize_gray(pixels: &Array2<f32>, height: usize, width: usize) -> OcrResult<Array2<f32>> {
    let (src_h, src_w) = pixels.dim();
    let data: Vec<f32> = pixels.iter().copied().collect();
    let buffer: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_raw(src_w as u32, src_h as u32, data).ok_or_else(|| {
            OCRError::resize_error(
                "line resize",
                SimpleError::new(format!("cannot wrap {src_h}x{src_w} grid as an image buffer")),
            )
        })?;

    // Use Triangle (bilinear) to match cv2.resize INTER_LINEAR
    let resized = image::imageops::resize(
        &buffer,
        width as u32,
        height as u32,
        image::imageops::FilterType::Triangle,
    );
    let values: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| v.clamp(0.0, 1.0))
        .collect();
    Ok(Array2::from_shape_vec((height, width), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCategory;
    use image::GrayImage;
    use std::path::Path;

    #[derive(Debug)]
    struct FailingReader;

    impl ImageReader for FailingReader {
        fn read_image(&self, path: &Path, _grayscale: bool) -> OcrResult<DynamicImage> {
            Err(OCRError::invalid_input(format!(
                "cannot read {}",
                path.display()
            )))
        }
    }

    #[test]
    fn test_scales_to_target_height_and_pads() {
        let normalizer = LineNormalizer::new(28, 952);
        let source = LineSource::Gray8(Array2::from_elem((56, 100), 255u8));
        let line = normalizer.normalize(&source, true).unwrap();

        assert_eq!(line.height(), 28);
        assert_eq!(line.width(), 952);
        assert_eq!(line.content_width(), 50);
        assert!((line.pixels()[[10, 20]] - 1.0).abs() < 1e-5);
        assert_eq!(line.pixels()[[10, 951]], 0.0);
    }

    #[test]
    fn test_wide_lines_are_squeezed_to_max_width() {
        let normalizer = LineNormalizer::new(28, 952);
        let source = LineSource::Gray8(Array2::zeros((28, 2000)));
        let line = normalizer.normalize(&source, true).unwrap();
        assert_eq!(line.width(), 952);
        assert_eq!(line.content_width(), 952);
    }

    #[test]
    fn test_narrow_crops_do_not_fail() {
        let normalizer = LineNormalizer::new(28, 952);
        for width in [1usize, 2, 3, 13] {
            let source = LineSource::Gray8(Array2::from_elem((28, width), 128u8));
            let line = normalizer.normalize(&source, true).unwrap();
            assert_eq!(line.width(), 952);
            assert!(line.content_width() >= 1);
        }
    }

    #[test]
    fn test_unpadded_keeps_scaled_width() {
        let normalizer = LineNormalizer::new(32, 320).with_padding(false);
        let source = LineSource::Gray8(Array2::zeros((16, 40)));
        let line = normalizer.normalize(&source, true).unwrap();
        assert_eq!(line.width(), 80);
    }

    #[test]
    fn test_float_pixels_on_byte_scale() {
        let normalizer = LineNormalizer::new(2, 4).with_padding(false);
        let source = LineSource::Gray32F(Array2::from_elem((2, 2), 255.0));
        let line = normalizer.normalize(&source, true).unwrap();
        assert!(line.pixels().iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_unit_scale_overshoot_is_clamped() {
        let normalizer = LineNormalizer::new(2, 4).with_padding(false);
        let mut pixels = Array2::from_elem((2, 4), 0.9f32);
        pixels[[0, 0]] = 1.0001;
        let line = normalizer
            .normalize(&LineSource::Gray32F(pixels), true)
            .unwrap();
        assert_eq!(line.pixels()[[0, 0]], 1.0);
        assert!((line.pixels()[[1, 3]] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_invert_and_background() {
        let normalizer = LineNormalizer::new(2, 4)
            .with_invert(true)
            .with_background(0.25);
        let source = LineSource::Gray8(Array2::zeros((2, 2)));
        let line = normalizer.normalize(&source, true).unwrap();
        assert_eq!(line.pixels()[[0, 0]], 1.0);
        assert_eq!(line.pixels()[[0, 3]], 0.25);
    }

    #[test]
    fn test_decoded_image_source() {
        let normalizer = LineNormalizer::new(28, 56);
        let source = LineSource::from(GrayImage::from_pixel(28, 28, Luma([255])));
        let line = normalizer.normalize(&source, true).unwrap();
        assert_eq!(line.content_width(), 28);
    }

    #[test]
    fn test_invalid_inputs_are_input_errors() {
        let normalizer = LineNormalizer::new(28, 952);

        let empty = LineSource::Gray8(Array2::zeros((0, 10)));
        assert_eq!(
            normalizer.normalize(&empty, true).unwrap_err().category(),
            ErrorCategory::Input
        );

        let mut nan = Array2::zeros((2, 2));
        nan[[0, 0]] = f32::NAN;
        assert!(
            normalizer
                .normalize(&LineSource::Gray32F(nan), true)
                .unwrap_err()
                .is_input_error()
        );

        let unreadable = normalizer.clone().with_reader(FailingReader);
        let err = unreadable
            .normalize(&LineSource::from("missing.png"), true)
            .unwrap_err();
        assert!(err.is_input_error());
    }
}
