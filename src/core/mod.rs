//! The core module of the line recognition pipeline.
//!
//! This module contains the fundamental components shared by the pipeline stages:
//! - Configuration management
//! - Constants
//! - Error handling
//! - ONNX Runtime inference
//! - Traits for the pipeline's external collaborators

pub mod config;
pub mod constants;
pub mod errors;
pub mod inference;
pub mod traits;

pub use config::{
    ConfigError, ConfigValidator, ConfigValidatorExt, OrtExecutionProvider,
    OrtGraphOptimizationLevel, OrtSessionConfig,
};
pub use constants::*;
pub use errors::{ErrorCategory, OCRError, OcrResult, ProcessingStage};
pub use inference::{DefaultImageReader, OrtInfer};
pub use traits::{ImageReader, InferenceEngine};
