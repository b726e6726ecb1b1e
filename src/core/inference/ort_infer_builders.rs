use super::*;
use crate::core::config::{OrtExecutionProvider, OrtGraphOptimizationLevel, OrtSessionConfig};
use crate::core::constants::DEFAULT_INPUT_NAME;
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use std::path::Path;

impl OrtInfer {
    /// Creates an engine with default ONNX Runtime settings and a single session.
    pub fn new(model_path: impl AsRef<Path>, input_name: Option<&str>) -> Result<Self, OCRError> {
        Self::with_pool(model_path, input_name, 1, None)
    }

    /// Creates an engine with `pool_size` sessions, each configured from `ort_config`.
    ///
    /// When `input_name` is `None` the first input declared by the model is used.
    pub fn with_pool(
        model_path: impl AsRef<Path>,
        input_name: Option<&str>,
        pool_size: usize,
        ort_config: Option<&OrtSessionConfig>,
    ) -> Result<Self, OCRError> {
        let path = model_path.as_ref();
        let pool_size = pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let builder = Session::builder()?.with_log_level(LogLevel::Error)?;
            let builder = match ort_config {
                Some(cfg) => Self::apply_ort_config(builder, cfg)?,
                None => builder,
            };
            let session = builder.commit_from_file(path).map_err(|e| {
                OCRError::model_load_error(
                    path,
                    "failed to create ONNX session",
                    Some("verify the model path and the selected execution providers"),
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let input_name = match input_name {
            Some(name) => name.to_string(),
            None => sessions
                .first()
                .and_then(|s| s.lock().ok())
                .and_then(|s| s.inputs.first().map(|i| i.name.clone()))
                .unwrap_or_else(|| DEFAULT_INPUT_NAME.to_string()),
        };

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown_model")
            .to_string();
        let output_name =
            resolve_output_name(&declared_output_names(&sessions), None, &model_name)?;

        tracing::info!(
            model = %model_name,
            path = %path.display(),
            pool_size,
            input = %input_name,
            output = %output_name,
            "loaded ONNX model"
        );

        Ok(OrtInfer {
            sessions,
            next_idx: std::sync::atomic::AtomicUsize::new(0),
            input_name,
            output_name,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Selects the output tensor to read instead of the first declared output.
    ///
    /// # Errors
    ///
    /// Returns a model error when the model declares no output of that name.
    pub fn with_output_name(mut self, output_name: impl Into<String>) -> Result<Self, OCRError> {
        let requested = output_name.into();
        self.output_name = resolve_output_name(
            &declared_output_names(&self.sessions),
            Some(requested.as_str()),
            &self.model_name,
        )?;
        Ok(self)
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GraphOptimizationLevel::Disable,
                OrtGraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
                OrtGraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
                OrtGraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps);
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    fn build_execution_providers(eps: &[OrtExecutionProvider]) -> Vec<ExecutionProviderDispatch> {
        let mut providers = Vec::new();

        for ep in eps {
            match ep {
                OrtExecutionProvider::CPU => {
                    providers.push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "cuda")]
                OrtExecutionProvider::CUDA { device_id } => {
                    let mut cuda_provider =
                        ort::execution_providers::CUDAExecutionProvider::default();
                    if let Some(id) = device_id {
                        cuda_provider = cuda_provider.with_device_id(*id);
                    }
                    providers.push(cuda_provider.build());
                }
                #[cfg(not(feature = "cuda"))]
                OrtExecutionProvider::CUDA { .. } => {
                    tracing::warn!("CUDA support not compiled in, skipping CUDA execution provider");
                }
            }
        }

        providers
    }
}

/// Output names declared by the first session of a pool.
fn declared_output_names(sessions: &[Mutex<Session>]) -> Vec<String> {
    sessions
        .first()
        .and_then(|s| s.lock().ok())
        .map(|s| s.outputs.iter().map(|o| o.name.clone()).collect())
        .unwrap_or_default()
}

/// Picks the output tensor to read: the requested name if the model declares it,
/// otherwise the first declared output.
pub(super) fn resolve_output_name(
    declared: &[String],
    requested: Option<&str>,
    model_name: &str,
) -> Result<String, OCRError> {
    match requested {
        Some(name) if declared.iter().any(|d| d == name) => Ok(name.to_string()),
        Some(name) => Err(OCRError::model_unavailable(
            model_name,
            &format!("model has no output named '{name}', declared outputs: {declared:?}"),
        )),
        None => declared.first().cloned().ok_or_else(|| {
            OCRError::model_unavailable(
                model_name,
                "no outputs available in session, the model may be invalid or corrupted",
            )
        }),
    }
}
