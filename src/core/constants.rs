//! Constants used throughout the line recognition pipeline.

/// Height, in pixels, of the line images the bundled dataset models consume.
pub const DEFAULT_LINE_HEIGHT: usize = 28;

/// Maximum number of characters an EMNIST-lines image holds.
pub const EMNIST_LINES_MAX_CHARS: usize = 34;

/// Maximum width, in pixels, of a normalized line image (34 characters of 28px).
pub const DEFAULT_MAX_LINE_WIDTH: usize = DEFAULT_LINE_HEIGHT * EMNIST_LINES_MAX_CHARS;

/// Directory searched for model weights when no explicit path is configured.
pub const DEFAULT_MODEL_DIR: &str = "models";

/// Input tensor name used when the model does not declare one.
pub const DEFAULT_INPUT_NAME: &str = "x";

/// The default threshold for parallel processing.
///
/// Batches with more items than this are processed with rayon.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

/// Tolerance on the sum of a probability grid row.
pub const PROBABILITY_SUM_TOLERANCE: f32 = 1e-2;

/// The maximum allowed tensor size.
///
/// Guards against pathological inputs allocating unbounded memory.
pub const MAX_TENSOR_SIZE: usize = 100_000_000;
