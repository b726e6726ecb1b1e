//! Dataset variants and the model contracts they bind.
//!
//! A variant fixes the vocabulary, the input shape and the weights file of one trained
//! line model. The bundled models were exported from Keras: they take a `[1, 28, 952]`
//! light-on-dark line and emit softmax probabilities `[1, T, classes]` with the CTC
//! blank as the last class.

use super::vocabulary::{BlankPosition, Vocabulary};
use crate::core::{DEFAULT_LINE_HEIGHT, DEFAULT_MAX_LINE_WIDTH, OcrResult};
use serde::{Deserialize, Serialize};

/// Punctuation appended after digits and letters in the EMNIST-lines charset.
const EMNIST_EXTRA_SYMBOLS: &str = " !\"#&'()*+,-./:;?";

/// Padding symbol the EMNIST-lines models emit past the end of the text.
const EMNIST_PADDING_SYMBOL: char = '_';

/// The trained model a predictor serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetVariant {
    /// Synthetic lines stitched from EMNIST characters.
    #[default]
    EmnistLines,
    /// Handwritten lines cropped from the IAM database.
    IamLines,
}

impl DatasetVariant {
    pub fn name(&self) -> &'static str {
        match self {
            DatasetVariant::EmnistLines => "emnist_lines",
            DatasetVariant::IamLines => "iam_lines",
        }
    }

    /// Weights file name looked up under the model directory.
    pub fn model_file(&self) -> &'static str {
        match self {
            DatasetVariant::EmnistLines => "emnist_lines_ctc.onnx",
            DatasetVariant::IamLines => "iam_lines_ctc.onnx",
        }
    }

    /// The full binding for this variant.
    pub fn spec(&self) -> OcrResult<DatasetSpec> {
        // Both variants share the EMNIST charset and the 28px line geometry.
        let vocabulary = emnist_vocabulary(BlankPosition::Last)?;
        Ok(DatasetSpec {
            variant: *self,
            vocabulary,
            input: ModelInputSpec::default(),
            output: ModelOutputSpec::default(),
            strip_chars: format!("{EMNIST_PADDING_SYMBOL} "),
        })
    }
}

impl std::fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DatasetVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "emnist_lines" | "emnist" => Ok(DatasetVariant::EmnistLines),
            "iam_lines" | "iam" => Ok(DatasetVariant::IamLines),
            other => Err(format!(
                "unknown dataset '{other}', expected emnist_lines or iam_lines"
            )),
        }
    }
}

/// Characters of the EMNIST-lines models in class order, blank excluded.
pub fn emnist_characters() -> impl Iterator<Item = char> {
    ('0'..='9')
        .chain('A'..='Z')
        .chain('a'..='z')
        .chain(EMNIST_EXTRA_SYMBOLS.chars())
        .chain(std::iter::once(EMNIST_PADDING_SYMBOL))
}

/// The EMNIST-lines vocabulary.
pub fn emnist_vocabulary(blank: BlankPosition) -> OcrResult<Vocabulary> {
    Vocabulary::new(emnist_characters(), blank)
}

/// Memory layout of the model's input tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    /// `[batch, channels, height, width]`
    Nchw,
    /// `[batch, height, width, channels]`
    Nhwc,
    /// `[batch, height, width]`
    #[default]
    Nhw,
}

/// Range the model expects pixel values in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRange {
    /// `[0, 1]`
    #[default]
    Unit,
    /// `[-1, 1]`
    Symmetric,
}

impl ValueRange {
    pub fn map(&self, v: f32) -> f32 {
        match self {
            ValueRange::Unit => v,
            ValueRange::Symmetric => v * 2.0 - 1.0,
        }
    }
}

/// Memory layout of the model's output tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// `[batch, time, classes]`
    #[default]
    BatchTimeClasses,
    /// `[time, batch, classes]`
    TimeBatchClasses,
}

/// What the model's output values are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    #[default]
    Probabilities,
    Logits,
    LogProbabilities,
}

/// Shape and value contract of the model input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInputSpec {
    /// Line height in pixels.
    pub height: usize,
    /// Maximum line width in pixels.
    pub max_width: usize,
    /// Whether every line is padded to `max_width`.
    pub fixed_width: bool,
    /// 1 for grayscale, 3 to replicate gray into RGB.
    pub channels: usize,
    pub layout: TensorLayout,
    pub value_range: ValueRange,
    /// Whether pixels are inverted after loading.
    pub invert: bool,
    /// Padding value in `[0, 1]`, after inversion.
    pub background: f32,
}

impl Default for ModelInputSpec {
    fn default() -> Self {
        Self {
            height: DEFAULT_LINE_HEIGHT,
            max_width: DEFAULT_MAX_LINE_WIDTH,
            fixed_width: true,
            channels: 1,
            layout: TensorLayout::Nhw,
            value_range: ValueRange::Unit,
            invert: false,
            background: 0.0,
        }
    }
}

/// Shape and value contract of the model output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOutputSpec {
    pub layout: OutputLayout,
    pub activation: OutputActivation,
}

/// Everything a predictor needs to know about one trained model.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub variant: DatasetVariant,
    pub vocabulary: Vocabulary,
    pub input: ModelInputSpec,
    pub output: ModelOutputSpec,
    /// Characters trimmed from both ends of decoded text.
    pub strip_chars: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emnist_vocabulary_layout() {
        let vocab = emnist_vocabulary(BlankPosition::Last).unwrap();
        // 10 digits, 52 letters, 17 symbols, padding, blank.
        assert_eq!(vocab.len(), 81);
        assert_eq!(vocab.symbol(0), Some('0'));
        assert_eq!(vocab.symbol(10), Some('A'));
        assert_eq!(vocab.symbol(36), Some('a'));
        assert_eq!(vocab.symbol(62), Some(' '));
        assert_eq!(vocab.symbol(79), Some('_'));
        assert_eq!(vocab.blank_index(), 80);
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!(
            "emnist-lines".parse::<DatasetVariant>().unwrap(),
            DatasetVariant::EmnistLines
        );
        assert_eq!("IAM".parse::<DatasetVariant>().unwrap(), DatasetVariant::IamLines);
        assert!("mnist".parse::<DatasetVariant>().is_err());
    }

    #[test]
    fn test_variant_spec_binds_geometry() {
        let spec = DatasetVariant::IamLines.spec().unwrap();
        assert_eq!(spec.input.height, 28);
        assert_eq!(spec.input.max_width, 952);
        assert_eq!(spec.variant.model_file(), "iam_lines_ctc.onnx");
        assert!(spec.strip_chars.contains('_'));
    }

    #[test]
    fn test_input_spec_deserializes_with_defaults() {
        let spec: ModelInputSpec =
            serde_json::from_str(r#"{"layout": "nchw", "value_range": "symmetric"}"#).unwrap();
        assert_eq!(spec.layout, TensorLayout::Nchw);
        assert_eq!(spec.height, 28);
        assert_eq!(spec.value_range.map(0.0), -1.0);
    }
}
