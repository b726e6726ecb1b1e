//! Line OCR command-line tool
//!
//! Recognizes handwritten text lines with a trained CTC model, or scores a model against
//! a directory of labeled line images.
//!
//! # Usage
//!
//! ```bash
//! line-ocr predict [OPTIONS] <IMAGES>...
//! line-ocr evaluate [OPTIONS] <DIR>
//! ```
//!
//! # Example
//!
//! ```bash
//! line-ocr predict --dataset emnist_lines --model-dir models line1.png line2.png
//! line-ocr evaluate --dataset iam_lines --device cuda tests/support/iam_lines
//! ```
//!
//! Set `RUST_LOG=info` to see progress logs.

use clap::{Args, Parser, Subcommand};
use line_ocr::core::config::OrtExecutionProvider;
use line_ocr::domain::{DatasetVariant, LineSource};
use line_ocr::predictor::{LinePredictor, LinePredictorBuilder, LinePredictorConfig};
use line_ocr::utils::{init_tracing, normalized_edit_distance};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "line-ocr")]
#[command(about = "Recognizes single lines of handwritten text")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recognize the text in one or more line images
    Predict {
        #[command(flatten)]
        model: ModelArgs,

        /// Print one JSON object per image instead of plain text
        #[arg(long)]
        json: bool,

        /// Paths to input images to process
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Score predictions on a directory of PNG images named after their text
    Evaluate {
        #[command(flatten)]
        model: ModelArgs,

        /// Fail when any image scores a normalized edit distance above this value
        #[arg(long, default_value_t = 0.2)]
        threshold: f32,

        /// Directory of labeled line images
        dir: PathBuf,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// JSON configuration file; the flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dataset variant whose model and charset to use (emnist_lines, iam_lines)
    #[arg(long)]
    dataset: Option<DatasetVariant>,

    /// Path to the model file
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Directory searched for `<dataset>_ctc.onnx`
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Character dictionary replacing the built-in charset
    #[arg(short = 'd', long)]
    char_dict_path: Option<PathBuf>,

    /// Device to use for inference (e.g., 'cpu', 'cuda', 'cuda:0'); keeps the
    /// configured providers when omitted
    #[arg(long)]
    device: Option<String>,

    /// Number of ONNX sessions
    #[arg(long)]
    session_pool_size: Option<usize>,
}

impl ModelArgs {
    fn build_predictor(&self) -> Result<LinePredictor, Box<dyn std::error::Error>> {
        let config = match &self.config {
            Some(path) => LinePredictorConfig::from_json_file(path)?,
            None => LinePredictorConfig::new(),
        };
        let mut builder = LinePredictorBuilder::from_config(config);
        if let Some(dataset) = self.dataset {
            builder = builder.dataset(dataset);
        }
        if let Some(path) = &self.model_path {
            builder = builder.model_path(path);
        }
        if let Some(dir) = &self.model_dir {
            builder = builder.model_dir(dir);
        }
        if let Some(path) = &self.char_dict_path {
            builder = builder.character_dict_path(path);
        }
        if let Some(size) = self.session_pool_size {
            builder = builder.session_pool_size(size);
        }

        builder = apply_device(builder, self.device.as_deref())?;

        info!(
            "Loading model {}",
            builder.config().resolved_model_path().display()
        );
        Ok(builder.build()?)
    }
}

/// Replaces the configured execution providers when a device was given.
fn apply_device(
    builder: LinePredictorBuilder,
    device: Option<&str>,
) -> Result<LinePredictorBuilder, String> {
    let Some(device) = device else {
        return Ok(builder);
    };
    let execution_providers = OrtExecutionProvider::parse_device(device)?;
    info!(
        "Using device: {} with providers: {:?}",
        device, execution_providers
    );
    let ort_config = builder
        .config()
        .ort_session
        .clone()
        .unwrap_or_default()
        .with_execution_providers(execution_providers);
    Ok(builder.ort_session(ort_config))
}

fn predict(
    predictor: &LinePredictor,
    images: &[PathBuf],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sources: Vec<LineSource> = images.iter().cloned().map(LineSource::Path).collect();
    let mut failures = 0;

    for (path, result) in images.iter().zip(predictor.predict_batch(&sources)) {
        match result {
            Ok(prediction) if json => {
                let positions = prediction.char_positions();
                let value = serde_json::json!({
                    "image": path.display().to_string(),
                    "text": prediction.text,
                    "confidence": prediction.confidence,
                    "char_positions": positions,
                });
                println!("{value}");
            }
            Ok(prediction) => {
                println!(
                    "{}\t{}\t{:.3}",
                    path.display(),
                    prediction.text,
                    prediction.confidence
                );
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} images failed", images.len()).into());
    }
    Ok(())
}

fn evaluate(
    predictor: &LinePredictor,
    dir: &Path,
    threshold: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")))
        .collect();
    images.sort();
    if images.is_empty() {
        return Err(format!("no PNG images found in {}", dir.display()).into());
    }

    let sources: Vec<LineSource> = images.iter().cloned().map(LineSource::Path).collect();
    let mut distances = Vec::with_capacity(images.len());
    let mut above_threshold = 0;

    for (path, result) in images.iter().zip(predictor.predict_batch(&sources)) {
        let truth = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prediction = match result {
            Ok(prediction) => prediction,
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                above_threshold += 1;
                continue;
            }
        };
        let distance = normalized_edit_distance(&prediction.text, &truth);
        println!(
            "Pred: \"{}\" | Confidence: {:.3} | True: {} | Edit distance: {:.3}",
            prediction.text, prediction.confidence, truth, distance
        );
        if distance > threshold {
            warn!("{} exceeds edit distance {}", path.display(), threshold);
            above_threshold += 1;
        }
        distances.push(distance);
    }

    if !distances.is_empty() {
        let mean = distances.iter().sum::<f32>() / distances.len() as f32;
        println!("Mean edit distance over {} images: {:.4}", distances.len(), mean);
    }
    if above_threshold > 0 {
        return Err(format!("{above_threshold} of {} images above threshold", images.len()).into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Predict {
            model,
            json,
            images,
        } => {
            let predictor = model.build_predictor()?;
            predict(&predictor, &images, json)
        }
        Command::Evaluate {
            model,
            threshold,
            dir,
        } => {
            let predictor = model.build_predictor()?;
            info!("Evaluating {} on {}", predictor.dataset(), dir.display());
            evaluate(&predictor, &dir, threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use line_ocr::core::OrtSessionConfig;

    fn cuda_config() -> LinePredictorConfig {
        LinePredictorConfig {
            ort_session: Some(
                OrtSessionConfig::new()
                    .with_execution_providers(vec![OrtExecutionProvider::CUDA { device_id: Some(1) }]),
            ),
            ..LinePredictorConfig::new()
        }
    }

    #[test]
    fn test_configured_providers_survive_without_device_flag() {
        let builder = apply_device(LinePredictorBuilder::from_config(cuda_config()), None).unwrap();
        assert_eq!(builder.config(), &cuda_config());
    }

    #[test]
    fn test_device_flag_overrides_configured_providers() {
        let builder =
            apply_device(LinePredictorBuilder::from_config(cuda_config()), Some("cpu")).unwrap();
        let providers = builder
            .config()
            .ort_session
            .as_ref()
            .and_then(|ort| ort.execution_providers.clone());
        assert_eq!(providers, Some(vec![OrtExecutionProvider::CPU]));
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        assert!(apply_device(LinePredictorBuilder::new(), Some("tpu")).is_err());
    }
}
