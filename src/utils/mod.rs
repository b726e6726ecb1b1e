//! Utility functions for the line recognition pipeline.
//!
//! This module provides image loading, dictionary loading, scoring metrics and
//! logging setup.

pub mod dict;
pub mod image;
pub mod metrics;

pub use dict::read_character_dict;
pub use image::{array_to_gray, read_image};
pub use metrics::{edit_distance, normalized_edit_distance};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and formatting layer.
/// It's typically called at the start of an application to enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
