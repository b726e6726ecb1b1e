//! Predictor implementations.
//!
//! This module contains the line predictor, which wires the image normalizer, the
//! model runner and the CTC decoder into a single `predict` call.

/// Handwritten text line predictor
pub mod line_predictor;

pub use line_predictor::{LinePredictor, LinePredictorBuilder, LinePredictorConfig};
