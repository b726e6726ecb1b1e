//! # Line OCR
//!
//! A Rust library that recognizes single lines of handwritten text using ONNX models
//! trained with CTC loss.
//!
//! ## Features
//!
//! - Accepts image files, decoded images or raw pixel grids of any width
//! - Resizes and pads lines to the geometry the model was trained on
//! - Best-path CTC decoding with a confidence score comparable across line widths
//! - Built-in bindings for the EMNIST-lines and IAM-lines models
//! - Batch prediction and a session pool for concurrent callers
//! - ONNX Runtime integration with optional CUDA execution
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, traits and the ONNX Runtime engine
//! * [`domain`] - Line images, vocabularies, probability grids and dataset bindings
//! * [`models`] - The CTC line model runner
//! * [`predictor`] - The line predictor facade and its configuration
//! * [`processors`] - Image normalization and CTC decoding
//! * [`utils`] - Image loading, dictionaries, metrics and logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use line_ocr::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let predictor = LinePredictorBuilder::new()
//!     .dataset(DatasetVariant::EmnistLines)
//!     .model_dir("models")
//!     .build()?;
//!
//! let prediction = predictor.predict("line.png")?;
//! println!("{} ({:.3})", prediction.text, prediction.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! ### JSON Configuration
//!
//! ```rust,no_run
//! use line_ocr::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config: LinePredictorConfig = serde_json::from_str(r#"
//! {
//!   "dataset": "iam_lines",
//!   "model_path": "models/iam_lines_ctc.onnx",
//!   "confidence": "geometric_mean",
//!   "session_pool_size": 2
//! }
//! "#)?;
//!
//! let predictor = LinePredictor::from_config(config)?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod core;
pub mod domain;
pub mod models;

pub mod predictor;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use line_ocr::prelude::*;
/// ```
///
/// For custom engines, decoders or normalizers import directly from the respective
/// modules (e.g., `line_ocr::core::traits`, `line_ocr::processors`).
pub mod prelude {
    // Predictor (essential)
    pub use crate::predictor::{LinePredictor, LinePredictorBuilder, LinePredictorConfig};

    // Inputs and results
    pub use crate::domain::{DatasetVariant, LineSource, Prediction};

    // Error Handling (essential)
    pub use crate::core::{OCRError, OcrResult};

    // Image Utility (minimal)
    pub use crate::utils::read_image;
}
