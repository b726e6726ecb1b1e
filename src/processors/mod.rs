//! Processing stages of the line recognition pipeline.
//!
//! # Modules
//!
//! * `decode` - Best-path CTC decoding of probability grids into text
//! * `line_normalizer` - Resizing and padding of line images to the model geometry

mod decode;
mod line_normalizer;

pub use decode::*;
pub use line_normalizer::*;
