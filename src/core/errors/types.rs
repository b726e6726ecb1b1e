//! Error types for the line recognition pipeline.
//!
//! Every failure the pipeline can report is a variant of [`OCRError`]. Variants are
//! grouped into the categories callers care about through [`OCRError::category`]:
//! input failures (the image could not be read), model failures (the loaded model is
//! unusable or disagrees with the configured shapes), decode failures (the model
//! produced an invalid probability grid) and configuration failures.

use crate::core::config::ConfigError;
use thiserror::Error;

/// Coarse classification of pipeline errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The image source could not be loaded or decoded.
    Input,
    /// The model is unavailable or its tensors do not match the configuration.
    Model,
    /// The probability grid handed to the decoder is malformed.
    Decode,
    /// The predictor configuration is invalid.
    Config,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Decode => write!(f, "decode"),
            ErrorCategory::Config => write!(f, "config"),
        }
    }
}

/// Stage of tensor processing where a [`OCRError::Processing`] error occurred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessingStage {
    /// Building or reshaping tensors.
    TensorOperation,
    /// Image resizing.
    Resize,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
            ProcessingStage::Resize => write!(f, "resize"),
        }
    }
}

/// Errors raised by the line recognition pipeline.
#[derive(Error, Debug)]
pub enum OCRError {
    /// The image could not be opened or decoded.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// The input cannot be turned into a line image.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// The model file could not be loaded into a session.
    #[error("failed to load model from '{}': {context}", path.display())]
    ModelLoad {
        /// Path of the model file.
        path: std::path::PathBuf,
        /// What was being attempted.
        context: String,
        /// Optional hint for fixing the problem.
        suggestion: Option<String>,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A forward pass failed.
    #[error("model '{model_name}' {operation} failed (input shape {input_shape:?}): {context}")]
    ModelInference {
        /// Name of the model.
        model_name: String,
        /// Inference step that failed.
        operation: String,
        /// Shape of the tensor fed to the model.
        input_shape: Vec<usize>,
        /// Additional context.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A tensor did not have the shape the model or configuration requires.
    #[error("model '{model_name}' shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Name of the model.
        model_name: String,
        /// Which tensor or dimension was checked.
        what: String,
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Tensor processing failed.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The probability grid is malformed.
    #[error("decode: {message}")]
    Decode {
        /// A message describing the malformed grid.
        message: String,
        /// Offending timestep, when known.
        timestep: Option<usize>,
    },

    /// A configuration problem detected while building the predictor.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Configuration validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from ndarray shape handling.
    #[error("tensor shape")]
    Tensor(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl OCRError {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            OCRError::ImageLoad(_) | OCRError::InvalidInput { .. } | OCRError::Io(_) => {
                ErrorCategory::Input
            }
            OCRError::ModelLoad { .. }
            | OCRError::ModelInference { .. }
            | OCRError::ShapeMismatch { .. }
            | OCRError::Processing { .. }
            | OCRError::Session(_)
            | OCRError::Tensor(_) => ErrorCategory::Model,
            OCRError::Decode { .. } => ErrorCategory::Decode,
            OCRError::ConfigError { .. } | OCRError::Config(_) => ErrorCategory::Config,
        }
    }

    /// Returns true for errors caused by the image source.
    pub fn is_input_error(&self) -> bool {
        self.category() == ErrorCategory::Input
    }

    /// Returns true for errors caused by the model or its tensors.
    pub fn is_model_error(&self) -> bool {
        self.category() == ErrorCategory::Model
    }

    /// Returns true for malformed probability grids.
    pub fn is_decode_error(&self) -> bool {
        self.category() == ErrorCategory::Decode
    }
}

/// Minimal error used as a `source` when no underlying error exists.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SimpleError {}
