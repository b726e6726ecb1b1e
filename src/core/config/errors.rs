//! Configuration error types and validation traits.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A model path does not exist.
    #[error("model path does not exist: {path}")]
    ModelPathNotFound { path: std::path::PathBuf },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A resource limit has been exceeded.
    #[error("resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },
}

/// A trait for validating configuration parameters.
///
/// Implementors provide [`ConfigValidator::validate`]; the remaining methods are
/// reusable checks for the fields line predictor configurations carry.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Checks that the model path exists and is a file.
    fn validate_model_path(&self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            Err(ConfigError::ModelPathNotFound {
                path: path.to_path_buf(),
            })
        } else if !path.is_file() {
            Err(ConfigError::InvalidConfig {
                message: format!("Model path is not a file: {}", path.display()),
            })
        } else {
            Ok(())
        }
    }

    /// Checks that image dimensions are positive.
    fn validate_image_dimensions(&self, width: usize, height: usize) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("Image dimensions must be positive, got {width}x{height}"),
            })
        } else {
            Ok(())
        }
    }

    /// Checks that a value lies within `[min, max]`.
    fn validate_f32_range(
        &self,
        value: f32,
        min: f32,
        max: f32,
        field_name: &str,
    ) -> Result<(), ConfigError> {
        if !value.is_finite() || value < min || value > max {
            Err(ConfigError::InvalidConfig {
                message: format!("{field_name} must be between {min} and {max}, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Checks that a count is positive.
    fn validate_positive_usize(&self, value: usize, field_name: &str) -> Result<(), ConfigError> {
        if value == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{field_name} must be greater than 0, got {value}"),
            })
        } else {
            Ok(())
        }
    }

    /// Checks that a thread count is positive and reasonable.
    fn validate_thread_count(&self, thread_count: usize) -> Result<(), ConfigError> {
        const MAX_REASONABLE_THREADS: usize = 256;

        if thread_count == 0 {
            Err(ConfigError::InvalidConfig {
                message: "Thread count must be greater than 0".to_string(),
            })
        } else if thread_count > MAX_REASONABLE_THREADS {
            Err(ConfigError::ResourceLimitExceeded {
                message: format!(
                    "Thread count {thread_count} exceeds reasonable maximum of {MAX_REASONABLE_THREADS}"
                ),
            })
        } else {
            Ok(())
        }
    }
}

/// Extension trait wrapping validation failures into [`OCRError`](crate::core::OCRError).
pub trait ConfigValidatorExt: ConfigValidator {
    /// Validates the configuration and returns it, or the error as an `OCRError`.
    fn validate_and_wrap_ocr_error(self) -> Result<Self, crate::core::OCRError>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }
}

impl<T: ConfigValidator> ConfigValidatorExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestValidator;

    impl ConfigValidator for TestValidator {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }

        fn get_defaults() -> Self {
            TestValidator
        }
    }

    #[test]
    fn test_validate_image_dimensions() {
        let v = TestValidator;
        assert!(v.validate_image_dimensions(952, 28).is_ok());
        assert!(v.validate_image_dimensions(0, 28).is_err());
        assert!(v.validate_image_dimensions(952, 0).is_err());
    }

    #[test]
    fn test_validate_f32_range_rejects_nan() {
        let v = TestValidator;
        assert!(v.validate_f32_range(0.5, 0.0, 1.0, "threshold").is_ok());
        assert!(v.validate_f32_range(1.5, 0.0, 1.0, "threshold").is_err());
        assert!(v.validate_f32_range(f32::NAN, 0.0, 1.0, "threshold").is_err());
    }

    #[test]
    fn test_validate_thread_count() {
        let v = TestValidator;
        assert!(v.validate_thread_count(4).is_ok());
        assert!(v.validate_thread_count(0).is_err());
        assert!(matches!(
            v.validate_thread_count(1024),
            Err(ConfigError::ResourceLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_validate_model_path_missing() {
        let v = TestValidator;
        let err = v
            .validate_model_path(Path::new("/nonexistent/line_model.onnx"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ModelPathNotFound { .. }));
    }
}
