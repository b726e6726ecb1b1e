//! Model wrappers for the line recognition pipeline.
//!
//! Models sit between the processors: they build input tensors, run an
//! [`InferenceEngine`](crate::core::InferenceEngine) and read its raw output.

pub mod recognition;

pub use recognition::*;
