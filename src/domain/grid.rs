//! Per-timestep probability grids produced by sequence models.

use crate::core::{OCRError, OcrResult, PROBABILITY_SUM_TOLERANCE};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// A `(timesteps, classes)` grid; each row is a distribution over the vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityGrid {
    probs: Array2<f32>,
}

impl ProbabilityGrid {
    /// Wraps a grid without checking it. [`validate`](Self::validate) does the checking.
    pub fn new(probs: Array2<f32>) -> Self {
        Self { probs }
    }

    /// Builds a grid from rows.
    ///
    /// # Errors
    ///
    /// Returns a decode error when rows have different lengths.
    pub fn from_rows(rows: &[Vec<f32>]) -> OcrResult<Self> {
        let classes = rows.first().map_or(0, Vec::len);
        if let Some(t) = rows.iter().position(|r| r.len() != classes) {
            return Err(OCRError::decode_error(
                format!(
                    "row {t} has {} classes, expected {classes}",
                    rows[t].len()
                ),
                Some(t),
            ));
        }
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let probs = Array2::from_shape_vec((rows.len(), classes), flat)?;
        Ok(Self { probs })
    }

    /// Converts raw logits to probabilities with a row-wise softmax.
    pub fn from_logits(logits: Array2<f32>) -> Self {
        let mut probs = logits;
        for mut row in probs.axis_iter_mut(Axis(0)) {
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            if !max.is_finite() {
                continue;
            }
            row.mapv_inplace(|v| (v - max).exp());
            let sum: f32 = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            }
        }
        Self { probs }
    }

    /// Converts log-probabilities to probabilities.
    pub fn from_log_probs(log_probs: Array2<f32>) -> Self {
        Self {
            probs: log_probs.mapv(f32::exp),
        }
    }

    pub fn timesteps(&self) -> usize {
        self.probs.nrows()
    }

    pub fn num_classes(&self) -> usize {
        self.probs.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.probs.view()
    }

    pub fn row(&self, t: usize) -> ArrayView1<'_, f32> {
        self.probs.row(t)
    }

    /// Most probable class of a row and its probability.
    ///
    /// Ties go to the lowest class index.
    pub fn argmax(&self, t: usize) -> (usize, f32) {
        let mut best = (0, f32::NEG_INFINITY);
        for (class, &p) in self.probs.row(t).iter().enumerate() {
            if p > best.1 {
                best = (class, p);
            }
        }
        best
    }

    /// Checks that the grid is a well-formed sequence of distributions over
    /// `expected_classes` classes.
    ///
    /// # Errors
    ///
    /// Returns a decode error for a class count mismatch, non-finite or negative
    /// values, or rows that do not sum to one.
    pub fn validate(&self, expected_classes: usize) -> OcrResult<()> {
        if self.num_classes() == 0 {
            return Err(OCRError::decode_error(
                "probability grid has no classes",
                None,
            ));
        }
        if self.num_classes() != expected_classes {
            return Err(OCRError::decode_error(
                format!(
                    "probability grid has {} classes but the vocabulary has {}",
                    self.num_classes(),
                    expected_classes
                ),
                None,
            ));
        }
        for (t, row) in self.probs.axis_iter(Axis(0)).enumerate() {
            if let Some(v) = row.iter().find(|v| !v.is_finite()) {
                return Err(OCRError::decode_error(
                    format!("timestep {t} contains non-finite value {v}"),
                    Some(t),
                ));
            }
            if let Some(v) = row.iter().find(|&&v| v < 0.0) {
                return Err(OCRError::decode_error(
                    format!("timestep {t} contains negative probability {v}"),
                    Some(t),
                ));
            }
            let sum: f32 = row.sum();
            if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
                return Err(OCRError::decode_error(
                    format!("timestep {t} probabilities sum to {sum}, expected 1"),
                    Some(t),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCategory;

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        let grid = ProbabilityGrid::from_rows(&[vec![0.4, 0.4, 0.2]]).unwrap();
        assert_eq!(grid.argmax(0), (0, 0.4));
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let err = ProbabilityGrid::from_rows(&[vec![0.5, 0.5], vec![1.0]]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Decode);
    }

    #[test]
    fn test_from_logits_rows_sum_to_one() {
        let logits = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, -5.0, 0.0, 5.0]).unwrap();
        let grid = ProbabilityGrid::from_logits(logits);
        for t in 0..grid.timesteps() {
            assert!((grid.row(t).sum() - 1.0).abs() < 1e-5);
        }
        assert_eq!(grid.argmax(0).0, 2);
        assert!(grid.validate(3).is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed_grids() {
        let grid = ProbabilityGrid::from_rows(&[vec![0.5, 0.5]]).unwrap();
        assert!(grid.validate(3).is_err());

        let grid = ProbabilityGrid::from_rows(&[vec![f32::NAN, 1.0]]).unwrap();
        assert!(grid.validate(2).unwrap_err().is_decode_error());

        let grid = ProbabilityGrid::from_rows(&[vec![-0.5, 1.5]]).unwrap();
        assert!(grid.validate(2).is_err());

        let grid = ProbabilityGrid::from_rows(&[vec![0.2, 0.2]]).unwrap();
        assert!(grid.validate(2).is_err());

        let grid = ProbabilityGrid::new(Array2::zeros((4, 0)));
        assert!(grid.validate(0).is_err());
    }

    #[test]
    fn test_empty_time_axis_is_valid() {
        let grid = ProbabilityGrid::new(Array2::zeros((0, 3)));
        assert!(grid.validate(3).is_ok());
        assert_eq!(grid.timesteps(), 0);
    }
}
