//! Traits at the seams of the line recognition pipeline.

pub mod granular;

pub use granular::{ImageReader, InferenceEngine};
