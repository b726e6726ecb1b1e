//! Domain-level structures shared across the line recognition pipeline.
//!
//! This module groups the data that flows between pipeline stages (line images,
//! probability grids, predictions) and the fixed bindings of each dataset variant.

pub mod dataset;
pub mod grid;
pub mod line_image;
pub mod prediction;
pub mod vocabulary;

pub use dataset::{
    DatasetSpec, DatasetVariant, ModelInputSpec, ModelOutputSpec, OutputActivation,
    OutputLayout, TensorLayout, ValueRange, emnist_characters, emnist_vocabulary,
};
pub use grid::ProbabilityGrid;
pub use line_image::{LineImage, LineSource};
pub use prediction::Prediction;
pub use vocabulary::{BlankPosition, Vocabulary};
