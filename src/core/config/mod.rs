//! Configuration management for the line recognition pipeline.
//!
//! This module provides the ONNX Runtime session configuration and the validation
//! traits shared by predictor configurations.

pub mod errors;
pub mod onnx;

pub use errors::{ConfigError, ConfigValidator, ConfigValidatorExt};
pub use onnx::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
