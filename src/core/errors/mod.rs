//! Error types for the line recognition pipeline.
//!
//! # Usage
//!
//! ```rust
//! use line_ocr::core::errors::{ErrorCategory, OCRError};
//!
//! let error = OCRError::invalid_input("image has zero width");
//! assert_eq!(error.category(), ErrorCategory::Input);
//! ```

pub mod constructors;
pub mod types;

pub use types::{ErrorCategory, OCRError, ProcessingStage, SimpleError};

/// Convenient result alias for pipeline operations.
pub type OcrResult<T> = Result<T, OCRError>;
