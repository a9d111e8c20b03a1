use serde::{Deserialize, Serialize};

use crate::classification::domain::classifier::{check_input, ClassificationError, Classifier};

/// Linear support vector classifier: positive iff `w·x + b > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSvm {
    coefficients: Vec<f32>,
    intercept: f32,
}

impl LinearSvm {
    pub fn new(coefficients: Vec<f32>, intercept: f32) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    pub fn is_finite(&self) -> bool {
        self.intercept.is_finite() && self.coefficients.iter().all(|w| w.is_finite())
    }

    /// Signed distance to the hyperplane, scaled by `|w|`.
    pub fn decision_function(&self, features: &[f32]) -> Result<f32, ClassificationError> {
        check_input(features, self.coefficients.len())?;
        // f64 accumulator over the full descriptor
        let dot: f64 = features
            .iter()
            .zip(&self.coefficients)
            .map(|(x, w)| *x as f64 * *w as f64)
            .sum();
        Ok((dot + self.intercept as f64) as f32)
    }
}

impl Classifier for LinearSvm {
    fn input_len(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f32]) -> Result<bool, ClassificationError> {
        Ok(self.decision_function(features)? > 0.0)
    }
}
