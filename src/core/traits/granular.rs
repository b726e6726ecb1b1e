//! Granular traits for the collaborators of the line predictor.
//!
//! The predictor is built from small components so each can be swapped or tested in
//! isolation:
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌───────────────┐    ┌──────────────┐
//! │ImageReader  │───▶│LineNormalizer│───▶│InferenceEngine│───▶│CTCLabelDecode│
//! │             │    │              │    │               │    │              │
//! │• read_image │    │• normalize   │    │• run          │    │• decode      │
//! └─────────────┘    └──────────────┘    └───────────────┘    └──────────────┘
//! ```
//!
//! Only the two collaborators that touch the outside world are traits: reading image
//! files and running the model.
//!
//! # Examples
//!
//! ```rust
//! use line_ocr::core::traits::InferenceEngine;
//! use line_ocr::core::OcrResult;
//! use ndarray::{ArrayD, IxDyn};
//!
//! // An engine that always predicts the blank symbol.
//! #[derive(Debug)]
//! struct BlankEngine { classes: usize }
//!
//! impl InferenceEngine for BlankEngine {
//!     fn run(&self, input: &ArrayD<f32>) -> OcrResult<ArrayD<f32>> {
//!         let timesteps = input.shape().last().copied().unwrap_or(0) / 4;
//!         let mut out = ArrayD::zeros(IxDyn(&[1, timesteps, self.classes]));
//!         for t in 0..timesteps {
//!             out[[0, t, 0]] = 1.0;
//!         }
//!         Ok(out)
//!     }
//!
//!     fn engine_info(&self) -> String {
//!         "blank".to_string()
//!     }
//! }
//!
//! let engine = BlankEngine { classes: 3 };
//! let out = engine.run(&ArrayD::zeros(IxDyn(&[1, 1, 28, 40]))).unwrap();
//! assert_eq!(out.shape(), &[1, 10, 3]);
//! ```

use crate::core::OCRError;
use image::DynamicImage;
use ndarray::ArrayD;
use std::fmt::Debug;
use std::path::Path;

/// Trait for loading images from disk.
pub trait ImageReader: Send + Sync + Debug {
    /// Reads one image, converting it to 8-bit grayscale when `grayscale` is set.
    ///
    /// # Errors
    ///
    /// Returns an input error when the file cannot be opened or decoded.
    fn read_image(&self, path: &Path, grayscale: bool) -> Result<DynamicImage, OCRError>;
}

/// Trait for inference engine operations.
///
/// An engine takes the fully prepared input tensor and returns the raw output tensor
/// of the sequence model. Interpreting the output layout and activation is left to the
/// model runner, so engines stay thin wrappers around a runtime.
pub trait InferenceEngine: Send + Sync + Debug {
    /// Performs a single forward pass.
    fn run(&self, input: &ArrayD<f32>) -> Result<ArrayD<f32>, OCRError>;

    /// Describes the engine (model name, backend).
    fn engine_info(&self) -> String;

    /// Returns the input shape declared by the model, if known.
    ///
    /// Dynamic dimensions are reported as negative values.
    fn declared_input_shape(&self) -> Option<Vec<i64>> {
        None
    }

    /// Returns the output shape declared by the model, if known.
    ///
    /// Dynamic dimensions are reported as negative values.
    fn declared_output_shape(&self) -> Option<Vec<i64>> {
        None
    }
}
