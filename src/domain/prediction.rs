//! The result of recognizing one line.

use serde::{Deserialize, Serialize};

/// Recognized text plus the per-character evidence it was decoded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Decoded text with padding stripped.
    pub text: String,
    /// Aggregate confidence in `[0, 1]`; `0.0` when no character was emitted.
    pub confidence: f32,
    /// Timestep at which each character of `text` started.
    pub char_timesteps: Vec<usize>,
    /// Probability of each character of `text` at its first timestep.
    pub char_probabilities: Vec<f32>,
    /// Length of the model's time axis.
    pub timesteps: usize,
}

impl Prediction {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Character positions as fractions of the line width, in `[0, 1)`.
    pub fn char_positions(&self) -> Vec<f32> {
        if self.timesteps == 0 {
            return Vec::new();
        }
        self.char_timesteps
            .iter()
            .map(|&t| t as f32 / self.timesteps as f32)
            .collect()
    }

    /// The `(text, confidence)` pair.
    pub fn into_pair(self) -> (String, f32) {
        (self.text, self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_positions_are_normalized() {
        let prediction = Prediction {
            text: "ab".to_string(),
            confidence: 0.9,
            char_timesteps: vec![0, 5],
            char_probabilities: vec![0.9, 0.9],
            timesteps: 10,
        };
        assert_eq!(prediction.char_positions(), vec![0.0, 0.5]);
        assert_eq!(prediction.into_pair(), ("ab".to_string(), 0.9));
    }

    #[test]
    fn test_empty_prediction() {
        let prediction = Prediction {
            text: String::new(),
            confidence: 0.0,
            char_timesteps: Vec::new(),
            char_probabilities: Vec::new(),
            timesteps: 0,
        };
        assert!(prediction.is_empty());
        assert_eq!(prediction.confidence, 0.0);
        assert!(prediction.char_positions().is_empty());
    }
}
