//! Recognition models.
//!
//! This module contains the CTC line model runner.

pub mod line_ctc;

pub use line_ctc::LineModelRunner;
