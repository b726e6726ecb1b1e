//! CTC line recognition model.
//!
//! This module wraps a loaded sequence model behind the tensor contract of one dataset
//! variant. It turns a normalized [`LineImage`] into the model's input tensor and reads
//! the raw output back as a [`ProbabilityGrid`], leaving decoding to the caller.

use crate::core::inference::OrtInfer;
use crate::core::{InferenceEngine, MAX_TENSOR_SIZE, OCRError, OcrResult};
use crate::domain::{
    LineImage, ModelInputSpec, ModelOutputSpec, OutputActivation, OutputLayout,
    ProbabilityGrid, TensorLayout,
};
use ndarray::{Array3, Array4, ArrayD, Axis, Ix2, Ix3};
use tracing::{debug, instrument};

/// Runs a line model and returns per-timestep class probabilities.
#[derive(Debug)]
pub struct LineModelRunner<E: InferenceEngine = OrtInfer> {
    engine: E,
    model_name: String,
    input: ModelInputSpec,
    output: ModelOutputSpec,
    num_classes: usize,
}

impl<E: InferenceEngine> LineModelRunner<E> {
    /// Wraps an engine.
    ///
    /// `num_classes` is the vocabulary size, blank included.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an impossible input contract, and a model error
    /// when the shapes declared by the model contradict the contract or the vocabulary.
    pub fn new(
        engine: E,
        model_name: impl Into<String>,
        input: ModelInputSpec,
        output: ModelOutputSpec,
        num_classes: usize,
    ) -> OcrResult<Self> {
        if !matches!(input.channels, 1 | 3) {
            return Err(OCRError::config_error(format!(
                "input channels must be 1 or 3, got {}",
                input.channels
            )));
        }
        if input.layout == TensorLayout::Nhw && input.channels != 1 {
            return Err(OCRError::config_error(
                "the NHW layout has no channel axis, channels must be 1",
            ));
        }

        let model_name = model_name.into();
        let max_size = input
            .channels
            .saturating_mul(input.height)
            .saturating_mul(input.max_width);
        if max_size > MAX_TENSOR_SIZE {
            return Err(OCRError::shape_mismatch(
                &model_name,
                "input tensor size",
                format!("at most {MAX_TENSOR_SIZE} elements"),
                max_size,
            ));
        }

        let runner = Self {
            engine,
            model_name,
            input,
            output,
            num_classes,
        };
        runner.check_declared_shapes()?;
        debug!(
            "line model '{}' ready: {}",
            runner.model_name,
            runner.engine.engine_info()
        );
        Ok(runner)
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn input_spec(&self) -> &ModelInputSpec {
        &self.input
    }

    pub fn output_spec(&self) -> &ModelOutputSpec {
        &self.output
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Runs one forward pass.
    ///
    /// # Errors
    ///
    /// Returns a model error when the image does not fit the input contract, the engine
    /// fails, or the output does not have one column per vocabulary class.
    #[instrument(level = "debug", skip_all, fields(model = %self.model_name, width = image.width()))]
    pub fn infer(&self, image: &LineImage) -> OcrResult<ProbabilityGrid> {
        let tensor = self.preprocess(image)?;
        let output = self.engine.run(&tensor)?;
        self.postprocess(output)
    }

    /// Builds the input tensor for a normalized line.
    pub fn preprocess(&self, image: &LineImage) -> OcrResult<ArrayD<f32>> {
        let (height, width) = (image.height(), image.width());
        if height != self.input.height {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "input height",
                self.input.height,
                height,
            ));
        }
        if width > self.input.max_width {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "input width",
                format!("at most {}", self.input.max_width),
                width,
            ));
        }
        if self.input.fixed_width && width != self.input.max_width {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "input width",
                self.input.max_width,
                width,
            ));
        }

        let channels = self.input.channels;
        let range = self.input.value_range;
        let pixels = image.pixels();
        let tensor = match self.input.layout {
            TensorLayout::Nhw => {
                Array3::from_shape_fn((1, height, width), |(_, y, x)| range.map(pixels[[y, x]]))
                    .into_dyn()
            }
            TensorLayout::Nchw => Array4::from_shape_fn((1, channels, height, width), |(_, _, y, x)| {
                range.map(pixels[[y, x]])
            })
            .into_dyn(),
            TensorLayout::Nhwc => Array4::from_shape_fn((1, height, width, channels), |(_, y, x, _)| {
                range.map(pixels[[y, x]])
            })
            .into_dyn(),
        };
        Ok(tensor)
    }

    /// Reads a raw output tensor as a probability grid.
    pub fn postprocess(&self, output: ArrayD<f32>) -> OcrResult<ProbabilityGrid> {
        let shape = output.shape().to_vec();
        let scores = match output.ndim() {
            2 => output.into_dimensionality::<Ix2>()?,
            3 => {
                let output = output.into_dimensionality::<Ix3>()?;
                let batch_axis = match self.output.layout {
                    OutputLayout::BatchTimeClasses => 0,
                    OutputLayout::TimeBatchClasses => 1,
                };
                if shape[batch_axis] != 1 {
                    return Err(OCRError::shape_mismatch(
                        &self.model_name,
                        "output batch size",
                        1,
                        shape[batch_axis],
                    ));
                }
                output.index_axis_move(Axis(batch_axis), 0)
            }
            ndim => {
                return Err(OCRError::shape_mismatch(
                    &self.model_name,
                    "output rank",
                    "2 or 3",
                    ndim,
                ));
            }
        };

        let classes = scores.ncols();
        if classes != self.num_classes {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "output classes",
                self.num_classes,
                classes,
            ));
        }
        debug!("model output {:?} -> {} timesteps", shape, scores.nrows());

        Ok(match self.output.activation {
            OutputActivation::Probabilities => ProbabilityGrid::new(scores),
            OutputActivation::Logits => ProbabilityGrid::from_logits(scores),
            OutputActivation::LogProbabilities => ProbabilityGrid::from_log_probs(scores),
        })
    }

    /// Compares the static dimensions the model declares with the contract.
    ///
    /// Dynamic dimensions (zero or negative) are skipped.
    fn check_declared_shapes(&self) -> OcrResult<()> {
        if let Some(shape) = self.engine.declared_input_shape() {
            let (rank, height_axis, width_axis, channel_axis) = match self.input.layout {
                TensorLayout::Nchw => (4, 2, 3, Some(1)),
                TensorLayout::Nhwc => (4, 1, 2, Some(3)),
                TensorLayout::Nhw => (3, 1, 2, None),
            };
            if shape.len() != rank {
                return Err(OCRError::shape_mismatch(
                    &self.model_name,
                    "input rank",
                    rank,
                    shape.len(),
                ));
            }
            let fixed = |axis: usize| usize::try_from(shape[axis]).ok().filter(|&d| d > 0);

            if let Some(height) = fixed(height_axis).filter(|&h| h != self.input.height) {
                return Err(OCRError::shape_mismatch(
                    &self.model_name,
                    "input height",
                    self.input.height,
                    height,
                ));
            }
            if let Some(width) = fixed(width_axis)
                .filter(|&w| !self.input.fixed_width || w != self.input.max_width)
            {
                let expected = if self.input.fixed_width {
                    self.input.max_width.to_string()
                } else {
                    "a dynamic width".to_string()
                };
                return Err(OCRError::shape_mismatch(
                    &self.model_name,
                    "input width",
                    expected,
                    width,
                ));
            }
            if let Some(channels) = channel_axis
                .and_then(fixed)
                .filter(|&c| c != self.input.channels)
            {
                return Err(OCRError::shape_mismatch(
                    &self.model_name,
                    "input channels",
                    self.input.channels,
                    channels,
                ));
            }
        }

        if let Some(classes) = self
            .engine
            .declared_output_shape()
            .and_then(|shape| shape.last().copied())
            .and_then(|d| usize::try_from(d).ok())
            .filter(|&d| d > 0 && d != self.num_classes)
        {
            return Err(OCRError::shape_mismatch(
                &self.model_name,
                "output classes",
                self.num_classes,
                classes,
            ));
        }
        Ok(())
    }
}
