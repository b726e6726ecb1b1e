//! Structures and helpers for ONNX Runtime inference.
//!
//! This module holds the low level inference engine and the default image reader,
//! the two collaborators of the predictor that touch the outside world.

pub mod image_reader;
pub mod ort_infer;

pub use image_reader::DefaultImageReader;
pub use ort_infer::OrtInfer;
