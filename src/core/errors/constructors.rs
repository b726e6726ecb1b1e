//! Helper constructors for [`OCRError`].
//!
//! These keep call sites short and make sure errors of the same kind carry the same
//! shape of context.
//!
//! ```rust
//! use line_ocr::core::{ErrorCategory, OCRError};
//!
//! let err = OCRError::decode_error("row 3 contains NaN", Some(3));
//! assert_eq!(err.category(), ErrorCategory::Decode);
//!
//! let err = OCRError::shape_mismatch("crnn", "input height", "28", "32");
//! assert!(err.is_model_error());
//! ```

use super::types::{OCRError, ProcessingStage, SimpleError};
use std::path::Path;

impl OCRError {
    /// Creates an [`OCRError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an [`OCRError::ConfigError`].
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an [`OCRError::Decode`] for a malformed probability grid.
    pub fn decode_error(message: impl Into<String>, timestep: Option<usize>) -> Self {
        Self::Decode {
            message: message.into(),
            timestep,
        }
    }

    /// Creates an [`OCRError::ModelLoad`] for a model file that could not be loaded.
    pub fn model_load_error(
        path: &Path,
        context: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            path: path.to_path_buf(),
            context: context.into(),
            suggestion: suggestion.map(str::to_string),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates an [`OCRError::ModelInference`] describing a failed forward pass.
    pub fn model_inference_error(
        model_name: &str,
        operation: &str,
        input_shape: &[usize],
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ModelInference {
            model_name: model_name.to_string(),
            operation: operation.to_string(),
            input_shape: input_shape.to_vec(),
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an [`OCRError::ModelInference`] for a model with no usable session.
    pub fn model_unavailable(model_name: &str, context: &str) -> Self {
        Self::model_inference_error(
            model_name,
            "session_lookup",
            &[],
            context,
            SimpleError::new("model not loaded"),
        )
    }

    /// Creates an [`OCRError::ShapeMismatch`].
    pub fn shape_mismatch(
        model_name: &str,
        what: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::ShapeMismatch {
            model_name: model_name.to_string(),
            what: what.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Creates an [`OCRError::Processing`] error for tensor operations.
    pub fn tensor_operation(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_with_context(ProcessingStage::TensorOperation, context, error)
    }

    /// Creates an [`OCRError::Processing`] error for image resizing.
    pub fn resize_error(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_with_context(ProcessingStage::Resize, context, error)
    }

    #[inline]
    fn processing_with_context(
        kind: ProcessingStage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.into(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCategory;

    #[test]
    fn test_constructors_map_to_categories() {
        assert_eq!(
            OCRError::invalid_input("empty").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            OCRError::model_unavailable("crnn", "no sessions").category(),
            ErrorCategory::Model
        );
        assert_eq!(
            OCRError::decode_error("bad", None).category(),
            ErrorCategory::Decode
        );
        assert_eq!(
            OCRError::config_error("bad").category(),
            ErrorCategory::Config
        );
        assert_eq!(
            OCRError::tensor_operation("reshape", SimpleError::new("x")).category(),
            ErrorCategory::Model
        );
        let err = OCRError::resize_error("line resize", SimpleError::new("x"));
        assert!(err.to_string().starts_with("resize failed"));
    }

    #[test]
    fn test_model_load_error_message_includes_path() {
        let err = OCRError::model_load_error(
            Path::new("models/missing.onnx"),
            "failed to create ONNX session",
            Some("verify the model file exists"),
            None::<SimpleError>,
        );
        let message = err.to_string();
        assert!(message.contains("models/missing.onnx"));
        assert!(message.contains("failed to create ONNX session"));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = OCRError::shape_mismatch("emnist_lines", "input height", 28, 32);
        assert_eq!(
            err.to_string(),
            "model 'emnist_lines' shape mismatch in input height: expected 28, got 32"
        );
    }
}
