//! Text decoding for CTC line models.
//!
//! This module converts per-timestep probability grids into text with best-path
//! (greedy) CTC decoding: the most probable class is taken at every timestep,
//! consecutive repeats are collapsed and blanks are dropped. Each emitted character
//! keeps the probability of the first timestep of its run, and those probabilities are
//! aggregated into a single confidence.

use crate::core::OcrResult;
use crate::domain::{Prediction, ProbabilityGrid, Vocabulary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How per-character probabilities are combined into a line confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceAggregation {
    /// `exp(mean(ln p))`. Independent of line length, sensitive to any weak character.
    #[default]
    GeometricMean,
    /// Product of all probabilities. Shrinks with line length.
    Product,
    /// Mean of all probabilities.
    ArithmeticMean,
}

impl ConfidenceAggregation {
    /// Aggregates probabilities into a value in `[0, 1]`; empty input gives `0.0`.
    pub fn aggregate(&self, probs: &[f32]) -> f32 {
        if probs.is_empty() {
            return 0.0;
        }
        let value = match self {
            ConfidenceAggregation::GeometricMean => {
                let log_sum: f64 = probs
                    .iter()
                    .map(|&p| f64::from(p.max(f32::MIN_POSITIVE)).ln())
                    .sum();
                (log_sum / probs.len() as f64).exp()
            }
            ConfidenceAggregation::Product => probs.iter().map(|&p| f64::from(p)).product(),
            ConfidenceAggregation::ArithmeticMean => {
                probs.iter().map(|&p| f64::from(p)).sum::<f64>() / probs.len() as f64
            }
        };
        (value as f32).clamp(0.0, 1.0)
    }
}

/// A decoder for CTC (Connectionist Temporal Classification) line models.
#[derive(Clone)]
pub struct CTCLabelDecode {
    vocabulary: Arc<Vocabulary>,
    aggregation: ConfidenceAggregation,
    strip_chars: Vec<char>,
}

impl std::fmt::Debug for CTCLabelDecode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CTCLabelDecode")
            .field("character_count", &self.vocabulary.characters().len())
            .field("blank_index", &self.vocabulary.blank_index())
            .field("aggregation", &self.aggregation)
            .field("strip_chars", &self.strip_chars)
            .finish()
    }
}

impl CTCLabelDecode {
    /// Creates a decoder over a vocabulary, with geometric-mean confidence and no stripping.
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            aggregation: ConfidenceAggregation::default(),
            strip_chars: Vec::new(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: ConfidenceAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Sets the characters trimmed from both ends of the decoded text.
    pub fn with_strip_chars(mut self, chars: &str) -> Self {
        self.strip_chars = chars.chars().collect();
        self
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn aggregation(&self) -> ConfidenceAggregation {
        self.aggregation
    }

    /// Most probable class at every timestep, with its probability.
    pub fn best_path(grid: &ProbabilityGrid) -> (Vec<usize>, Vec<f32>) {
        (0..grid.timesteps()).map(|t| grid.argmax(t)).unzip()
    }

    /// Decodes a grid into a prediction.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the grid is malformed or its class count does not
    /// match the vocabulary.
    pub fn decode(&self, grid: &ProbabilityGrid) -> OcrResult<Prediction> {
        grid.validate(self.vocabulary.len())?;

        let (classes, probs) = Self::best_path(grid);
        let mut chars: Vec<(char, usize, f32)> = Vec::new();
        let mut previous: Option<usize> = None;
        for (t, (&class, &prob)) in classes.iter().zip(&probs).enumerate() {
            if previous == Some(class) {
                continue;
            }
            previous = Some(class);
            if let Some(c) = self.vocabulary.symbol(class) {
                chars.push((c, t, prob));
            }
        }

        let start = chars
            .iter()
            .position(|(c, _, _)| !self.strip_chars.contains(c))
            .unwrap_or(chars.len());
        let end = chars
            .iter()
            .rposition(|(c, _, _)| !self.strip_chars.contains(c))
            .map_or(start, |i| i + 1);
        let kept = &chars[start..end];

        let char_probabilities: Vec<f32> = kept.iter().map(|&(_, _, p)| p).collect();
        let prediction = Prediction {
            text: kept.iter().map(|&(c, _, _)| c).collect(),
            confidence: self.aggregation.aggregate(&char_probabilities),
            char_timesteps: kept.iter().map(|&(_, t, _)| t).collect(),
            char_probabilities,
            timesteps: grid.timesteps(),
        };

        debug!(
            "decoded {} timesteps into {} characters, confidence {:.4}",
            prediction.timesteps,
            prediction.text.chars().count(),
            prediction.confidence
        );
        Ok(prediction)
    }
}

/// Decodes a grid into `(text, confidence)` with default decoder settings.
pub fn decode(grid: &ProbabilityGrid, vocabulary: Arc<Vocabulary>) -> OcrResult<(String, f32)> {
    CTCLabelDecode::new(vocabulary)
        .decode(grid)
        .map(Prediction::into_pair)
}
