use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("feature vector has {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("feature value at index {0} is not finite")]
    NonFinite(usize),
}

/// Fitted per-feature transform applied before classification.
pub trait FeatureScaler: Send + Sync {
    fn input_len(&self) -> usize;
    fn transform(&self, features: &[f32]) -> Result<Vec<f32>, ClassificationError>;
}

/// Binary vehicle / non-vehicle decision over a scaled feature vector.
pub trait Classifier: Send + Sync {
    fn input_len(&self) -> usize;
    fn predict(&self, features: &[f32]) -> Result<bool, ClassificationError>;
}

/// Shared input check for scaler and classifier implementations.
pub fn check_input(features: &[f32], expected: usize) -> Result<(), ClassificationError> {
    if features.len() != expected {
        return Err(ClassificationError::LengthMismatch {
            expected,
            actual: features.len(),
        });
    }
    if let Some(i) = features.iter().position(|v| !v.is_finite()) {
        return Err(ClassificationError::NonFinite(i));
    }
    Ok(())
}
