//! Line Predictor
//!
//! This module implements the public entry point of the crate: a predictor that takes
//! one image of a handwritten text line and returns the recognized text with a
//! confidence score.
//!
//! The main components are:
//! - `LinePredictor`: Normalizer, model runner and CTC decoder wired in sequence
//! - `LinePredictorConfig`: Serializable configuration for the predictor
//! - `LinePredictorBuilder`: Builder for creating predictor instances

use crate::core::{
    ConfigError, ConfigValidator, ConfigValidatorExt, DEFAULT_MODEL_DIR,
    DEFAULT_PARALLEL_THRESHOLD, DefaultImageReader, ImageReader, InferenceEngine, OCRError,
    OcrResult, OrtInfer, OrtSessionConfig,
};
use crate::domain::{
    BlankPosition, DatasetSpec, DatasetVariant, LineSource, ModelInputSpec, ModelOutputSpec,
    Prediction, Vocabulary,
};
use crate::models::LineModelRunner;
use crate::processors::{CTCLabelDecode, ConfidenceAggregation, LineNormalizer};
use crate::utils::read_character_dict;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Configuration for the line predictor
///
/// Every field has a default, so a JSON file only needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinePredictorConfig {
    /// Trained model to serve
    pub dataset: DatasetVariant,
    /// Explicit weights file; overrides `model_dir`
    pub model_path: Option<PathBuf>,
    /// Directory holding `<dataset>_ctc.onnx` weights
    pub model_dir: PathBuf,
    /// Dictionary file replacing the built-in charset, one symbol per line
    pub character_dict_path: Option<PathBuf>,
    /// Blank position override for custom models
    pub blank_position: Option<BlankPosition>,
    /// Input contract override
    pub input: Option<ModelInputSpec>,
    /// Output contract override
    pub output: Option<ModelOutputSpec>,
    /// Input tensor name; the first declared input when unset
    pub input_name: Option<String>,
    /// Output tensor name; the first declared output when unset
    pub output_name: Option<String>,
    /// How character probabilities combine into the line confidence
    pub confidence: ConfidenceAggregation,
    /// Characters trimmed from both ends of decoded text; the dataset's padding when unset
    pub strip_chars: Option<String>,
    /// Whether image files are read as grayscale
    pub grayscale: bool,
    /// Number of ONNX sessions shared by concurrent callers
    pub session_pool_size: usize,
    /// Batches larger than this are predicted in parallel
    pub parallel_threshold: usize,
    /// ONNX Runtime session options
    pub ort_session: Option<OrtSessionConfig>,
}

impl Default for LinePredictorConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetVariant::default(),
            model_path: None,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            character_dict_path: None,
            blank_position: None,
            input: None,
            output: None,
            input_name: None,
            output_name: None,
            confidence: ConfidenceAggregation::default(),
            strip_chars: None,
            grayscale: true,
            session_pool_size: 1,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            ort_session: None,
        }
    }
}

impl LinePredictorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration for a dataset variant.
    pub fn for_dataset(dataset: DatasetVariant) -> Self {
        Self {
            dataset,
            ..Self::default()
        }
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or parsed, or fails
    /// validation.
    pub fn from_json_file(path: impl AsRef<Path>) -> OcrResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OCRError::config_error(format!(
                "failed to read configuration '{}': {e}",
                path.display()
            ))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            OCRError::config_error(format!(
                "failed to parse configuration '{}': {e}",
                path.display()
            ))
        })?;
        config.validate_and_wrap_ocr_error()
    }

    /// Weights file the predictor loads.
    pub fn resolved_model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.model_dir.join(self.dataset.model_file()))
    }

    /// The dataset binding with every override applied.
    pub fn dataset_spec(&self) -> OcrResult<DatasetSpec> {
        let mut spec = self.dataset.spec()?;
        let blank = self
            .blank_position
            .unwrap_or(spec.vocabulary.blank_position());

        if let Some(dict_path) = &self.character_dict_path {
            let lines = read_character_dict(dict_path)?;
            spec.vocabulary = Vocabulary::from_lines(&lines, blank)?;
        } else if blank != spec.vocabulary.blank_position() {
            spec.vocabulary = Vocabulary::new(spec.vocabulary.characters().iter().copied(), blank)?;
        }
        if let Some(input) = &self.input {
            spec.input = input.clone();
        }
        if let Some(output) = self.output {
            spec.output = output;
        }
        if let Some(strip_chars) = &self.strip_chars {
            spec.strip_chars = strip_chars.clone();
        }
        Ok(spec)
    }
}

impl ConfigValidator for LinePredictorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_usize(self.session_pool_size, "session_pool_size")?;

        if let Some(input) = &self.input {
            self.validate_image_dimensions(input.max_width, input.height)?;
            if !matches!(input.channels, 1 | 3) {
                return Err(ConfigError::InvalidConfig {
                    message: format!("input channels must be 1 or 3, got {}", input.channels),
                });
            }
            self.validate_f32_range(input.background, 0.0, 1.0, "input background")?;
        }

        if let Some(ort) = &self.ort_session {
            if let Some(threads) = ort.intra_threads {
                self.validate_thread_count(threads)?;
            }
            if let Some(threads) = ort.inter_threads {
                self.validate_thread_count(threads)?;
            }
        }

        if let Some(dict_path) = &self.character_dict_path
            && !dict_path.is_file()
        {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "character dictionary not found: {}",
                    dict_path.display()
                ),
            });
        }

        Ok(())
    }

    fn get_defaults() -> Self {
        Self::new()
    }
}

/// Recognizes single lines of handwritten text.
///
/// The loaded model is read-only, so one predictor can serve concurrent callers.
#[derive(Debug)]
pub struct LinePredictor<E: InferenceEngine = OrtInfer, R: ImageReader = DefaultImageReader> {
    dataset: DatasetVariant,
    vocabulary: Arc<Vocabulary>,
    normalizer: LineNormalizer<R>,
    runner: LineModelRunner<E>,
    decoder: CTCLabelDecode,
    grayscale: bool,
    parallel_threshold: usize,
}

impl LinePredictor {
    /// Loads the default model of a dataset variant from the default model directory.
    pub fn new(dataset: DatasetVariant) -> OcrResult<Self> {
        Self::from_config(LinePredictorConfig::for_dataset(dataset))
    }

    /// Loads the ONNX model named by a configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid configuration or a missing weights
    /// file, and a model error when ONNX Runtime cannot load the model.
    pub fn from_config(config: LinePredictorConfig) -> OcrResult<Self> {
        let config = config.validate_and_wrap_ocr_error()?;
        let model_path = config.resolved_model_path();
        config.validate_model_path(&model_path)?;

        let mut engine = OrtInfer::with_pool(
            &model_path,
            config.input_name.as_deref(),
            config.session_pool_size,
            config.ort_session.as_ref(),
        )?;
        if let Some(output_name) = &config.output_name {
            engine = engine.with_output_name(output_name.clone())?;
        }
        Self::with_engine(config, engine)
    }
}

impl<E: InferenceEngine> LinePredictor<E> {
    /// Builds a predictor around an already loaded engine.
    pub fn with_engine(config: LinePredictorConfig, engine: E) -> OcrResult<Self> {
        let config = config.validate_and_wrap_ocr_error()?;
        let spec = config.dataset_spec()?;
        let vocabulary = Arc::new(spec.vocabulary);

        let normalizer = LineNormalizer::from_input_spec(&spec.input);
        let runner = LineModelRunner::new(
            engine,
            spec.variant.name(),
            spec.input,
            spec.output,
            vocabulary.len(),
        )?;
        let decoder = CTCLabelDecode::new(Arc::clone(&vocabulary))
            .with_aggregation(config.confidence)
            .with_strip_chars(&spec.strip_chars);

        info!(
            dataset = %spec.variant,
            classes = vocabulary.len(),
            engine = %runner.engine().engine_info(),
            "line predictor ready"
        );

        Ok(Self {
            dataset: spec.variant,
            vocabulary,
            normalizer,
            runner,
            decoder,
            grayscale: config.grayscale,
            parallel_threshold: config.parallel_threshold,
        })
    }
}

impl<E: InferenceEngine, R: ImageReader> LinePredictor<E, R> {
    /// Replaces the reader used for image files.
    pub fn with_image_reader<R2: ImageReader>(self, reader: R2) -> LinePredictor<E, R2> {
        LinePredictor {
            dataset: self.dataset,
            vocabulary: self.vocabulary,
            normalizer: self.normalizer.with_reader(reader),
            runner: self.runner,
            decoder: self.decoder,
            grayscale: self.grayscale,
            parallel_threshold: self.parallel_threshold,
        }
    }

    /// Recognizes one line.
    ///
    /// # Errors
    ///
    /// Returns an input error for unreadable or empty images, a model error when
    /// inference fails, and a decode error for a malformed model output.
    pub fn predict(&self, source: impl Into<LineSource>) -> OcrResult<Prediction> {
        self.predict_source(&source.into())
    }

    /// Recognizes the line stored in an image file.
    pub fn predict_path(&self, path: impl AsRef<Path>) -> OcrResult<Prediction> {
        self.predict_source(&LineSource::Path(path.as_ref().to_path_buf()))
    }

    /// Recognizes a line given as 8-bit grayscale pixels.
    pub fn predict_pixels(&self, pixels: Array2<u8>) -> OcrResult<Prediction> {
        self.predict_source(&LineSource::Gray8(pixels))
    }

    #[instrument(level = "debug", skip_all, fields(dataset = %self.dataset))]
    pub fn predict_source(&self, source: &LineSource) -> OcrResult<Prediction> {
        debug!("predicting {}", source.describe());
        let image = self.normalizer.normalize(source, self.grayscale)?;
        let grid = self.runner.infer(&image)?;
        self.decoder.decode(&grid)
    }

    /// Recognizes many lines, in parallel above the configured threshold.
    ///
    /// Results are in input order; one failing line does not affect the others.
    pub fn predict_batch(&self, sources: &[LineSource]) -> Vec<OcrResult<Prediction>> {
        if sources.len() > self.parallel_threshold {
            sources
                .par_iter()
                .map(|source| self.predict_source(source))
                .collect()
        } else {
            sources
                .iter()
                .map(|source| self.predict_source(source))
                .collect()
        }
    }

    pub fn dataset(&self) -> DatasetVariant {
        self.dataset
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn normalizer(&self) -> &LineNormalizer<R> {
        &self.normalizer
    }

    pub fn runner(&self) -> &LineModelRunner<E> {
        &self.runner
    }

    pub fn decoder(&self) -> &CTCLabelDecode {
        &self.decoder
    }
}

/// Builder for `LinePredictor`
#[derive(Debug, Clone, Default)]
pub struct LinePredictorBuilder {
    config: LinePredictorConfig,
}

impl LinePredictorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: LinePredictorConfig) -> Self {
        Self { config }
    }

    pub fn dataset(mut self, dataset: DatasetVariant) -> Self {
        self.config.dataset = dataset;
        self
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model_path = Some(path.into());
        self
    }

    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = dir.into();
        self
    }

    pub fn character_dict_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.character_dict_path = Some(path.into());
        self
    }

    pub fn blank_position(mut self, blank: BlankPosition) -> Self {
        self.config.blank_position = Some(blank);
        self
    }

    pub fn input_spec(mut self, input: ModelInputSpec) -> Self {
        self.config.input = Some(input);
        self
    }

    pub fn output_spec(mut self, output: ModelOutputSpec) -> Self {
        self.config.output = Some(output);
        self
    }

    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.config.input_name = Some(name.into());
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_name = Some(name.into());
        self
    }

    pub fn confidence_aggregation(mut self, aggregation: ConfidenceAggregation) -> Self {
        self.config.confidence = aggregation;
        self
    }

    pub fn strip_chars(mut self, chars: impl Into<String>) -> Self {
        self.config.strip_chars = Some(chars.into());
        self
    }

    pub fn grayscale(mut self, grayscale: bool) -> Self {
        self.config.grayscale = grayscale;
        self
    }

    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.config.session_pool_size = size;
        self
    }

    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.config.ort_session = Some(config);
        self
    }

    pub fn config(&self) -> &LinePredictorConfig {
        &self.config
    }

    /// Loads the ONNX model and builds the predictor.
    pub fn build(self) -> OcrResult<LinePredictor> {
        LinePredictor::from_config(self.config)
    }

    /// Builds the predictor around an already loaded engine.
    pub fn build_with_engine<E: InferenceEngine>(self, engine: E) -> OcrResult<LinePredictor<E>> {
        LinePredictor::with_engine(self.config, engine)
    }
}
