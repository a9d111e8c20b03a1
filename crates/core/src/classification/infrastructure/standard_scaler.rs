use serde::{Deserialize, Serialize};

use crate::classification::domain::classifier::{check_input, ClassificationError, FeatureScaler};

/// Zero-mean, unit-variance scaling with parameters fitted offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

impl StandardScaler {
    /// Returns `None` when `mean` and `scale` disagree in length.
    pub fn new(mean: Vec<f32>, scale: Vec<f32>) -> Option<Self> {
        (mean.len() == scale.len()).then_some(Self { mean, scale })
    }

    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    pub fn scale(&self) -> &[f32] {
        &self.scale
    }

    /// Consistent when both vectors have one entry per feature and every
    /// parameter is finite.
    pub fn is_consistent(&self) -> bool {
        self.mean.len() == self.scale.len()
            && self.mean.iter().chain(&self.scale).all(|v| v.is_finite())
    }
}

impl FeatureScaler for StandardScaler {
    fn input_len(&self) -> usize {
        self.mean.len()
    }

    fn transform(&self, features: &[f32]) -> Result<Vec<f32>, ClassificationError> {
        check_input(features, self.input_len())?;
        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                // Constant features were fitted with zero variance
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(vec![1.0, 2.0, 3.0], vec![2.0, 0.5, 1.0]).unwrap();
        let out = scaler.transform(&[3.0, 2.0, 0.0]).unwrap();
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], 0.0);
        assert_relative_eq!(out[2], -3.0);
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        let scaler = StandardScaler::new(vec![5.0], vec![0.0]).unwrap();
        assert_eq!(scaler.transform(&[7.0]).unwrap(), vec![2.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let scaler = StandardScaler::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        assert!(matches!(
            scaler.transform(&[0.0; 4]),
            Err(ClassificationError::LengthMismatch {
                expected: 3,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_new_rejects_mismatched_parameters() {
        assert!(StandardScaler::new(vec![0.0; 2], vec![1.0; 3]).is_none());
    }

    #[test]
    fn test_deserialized_inconsistency_detected() {
        let scaler: StandardScaler =
            serde_json::from_str(r#"{"mean": [0.0, 1.0], "scale": [1.0]}"#).unwrap();
        assert!(!scaler.is_consistent());
    }
}
