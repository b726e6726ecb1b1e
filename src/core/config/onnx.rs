//! ONNX Runtime session configuration.
//!
//! Accelerator selection is process-wide startup configuration: it is set here once,
//! before the predictor loads its sessions, and never consulted during prediction.

use serde::{Deserialize, Serialize};

/// Graph optimization levels for ONNX Runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all optimizations.
    DisableAll,
    /// Enable basic optimizations.
    #[default]
    Level1,
    /// Enable extended optimizations.
    Level2,
    /// Enable all optimizations.
    Level3,
}

/// Execution providers for ONNX Runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum OrtExecutionProvider {
    /// CPU execution provider (always available)
    #[default]
    CPU,
    /// NVIDIA CUDA execution provider
    CUDA {
        /// CUDA device ID (default: 0)
        device_id: Option<i32>,
    },
}

impl OrtExecutionProvider {
    /// Parses a device string such as `cpu`, `cuda` or `cuda:1`.
    ///
    /// CUDA devices are followed by a CPU fallback provider.
    pub fn parse_device(device: &str) -> Result<Vec<OrtExecutionProvider>, String> {
        let device = device.trim().to_lowercase();

        if device == "cpu" {
            Ok(vec![OrtExecutionProvider::CPU])
        } else if device == "cuda" {
            Ok(vec![
                OrtExecutionProvider::CUDA { device_id: Some(0) },
                OrtExecutionProvider::CPU,
            ])
        } else if let Some(id) = device.strip_prefix("cuda:") {
            let device_id: i32 = id
                .parse()
                .map_err(|_| format!("invalid CUDA device id '{id}'"))?;
            Ok(vec![
                OrtExecutionProvider::CUDA {
                    device_id: Some(device_id),
                },
                OrtExecutionProvider::CPU,
            ])
        } else {
            Err(format!(
                "unsupported device '{device}', expected 'cpu', 'cuda' or 'cuda:N'"
            ))
        }
    }
}

/// Configuration for ONNX Runtime sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes
    pub inter_threads: Option<usize>,
    /// Graph optimization level
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
    /// Execution providers in order of preference
    pub execution_providers: Option<Vec<OrtExecutionProvider>>,
}

impl OrtSessionConfig {
    /// Creates a new OrtSessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }

    /// Sets the execution providers.
    pub fn with_execution_providers(mut self, providers: Vec<OrtExecutionProvider>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Returns the execution providers, defaulting to CPU only.
    pub fn get_execution_providers(&self) -> Vec<OrtExecutionProvider> {
        self.execution_providers
            .clone()
            .unwrap_or_else(|| vec![OrtExecutionProvider::CPU])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ort_session_config_builder() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(4)
            .with_inter_threads(2)
            .with_optimization_level(OrtGraphOptimizationLevel::Level2);

        assert_eq!(config.intra_threads, Some(4));
        assert_eq!(config.inter_threads, Some(2));
        assert_eq!(
            config.optimization_level,
            Some(OrtGraphOptimizationLevel::Level2)
        );
        assert_eq!(
            config.get_execution_providers(),
            vec![OrtExecutionProvider::CPU]
        );
    }

    #[test]
    fn test_parse_device() {
        assert_eq!(
            OrtExecutionProvider::parse_device("CPU").unwrap(),
            vec![OrtExecutionProvider::CPU]
        );
        assert_eq!(
            OrtExecutionProvider::parse_device("cuda:1").unwrap(),
            vec![
                OrtExecutionProvider::CUDA { device_id: Some(1) },
                OrtExecutionProvider::CPU
            ]
        );
        assert!(OrtExecutionProvider::parse_device("cuda:x").is_err());
        assert!(OrtExecutionProvider::parse_device("tpu").is_err());
    }

    #[test]
    fn test_session_config_serde() {
        let config = OrtSessionConfig::new()
            .with_intra_threads(2)
            .with_execution_providers(vec![OrtExecutionProvider::CUDA { device_id: Some(0) }]);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: OrtSessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
