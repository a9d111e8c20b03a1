use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::linear_svm::LinearSvm;
use super::standard_scaler::StandardScaler;
use crate::classification::domain::classifier::{Classifier, FeatureScaler};
use crate::features::domain::feature_params::{FeatureError, FeatureParams};

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model feature parameters are invalid: {0}")]
    Invalid(#[from] FeatureError),
    #[error("model {component} expects {actual} features, parameters produce {expected}")]
    Inconsistent {
        component: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("model {0} contains non-finite parameters")]
    NonFinite(&'static str),
}

/// Trained classifier, its scaler, and the feature parameters it was
/// trained with. Produced offline and loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub params: FeatureParams,
    pub scaler: StandardScaler,
    pub classifier: LinearSvm,
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_str(&text).map_err(|source| ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        artifact.validate()?;

        log::info!(
            "Loaded model {}: {} color space, {} features",
            path.display(),
            artifact.params.color_space,
            artifact.params.feature_len()
        );
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelLoadError> {
        let text = serde_json::to_string(self).map_err(|source| ModelLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Feature parameters must be valid and every component must agree
    /// on the descriptor length they produce.
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        self.params.validate()?;
        let expected = self.params.feature_len();

        if self.scaler.mean().len() != self.scaler.scale().len() {
            return Err(ModelLoadError::Inconsistent {
                component: "scaler scale",
                expected: self.scaler.mean().len(),
                actual: self.scaler.scale().len(),
            });
        }
        if self.scaler.input_len() != expected {
            return Err(ModelLoadError::Inconsistent {
                component: "scaler",
                expected,
                actual: self.scaler.input_len(),
            });
        }
        if self.classifier.input_len() != expected {
            return Err(ModelLoadError::Inconsistent {
                component: "classifier",
                expected,
                actual: self.classifier.input_len(),
            });
        }
        if !self.scaler.is_consistent() {
            return Err(ModelLoadError::NonFinite("scaler"));
        }
        if !self.classifier.is_finite() {
            return Err(ModelLoadError::NonFinite("classifier"));
        }
        Ok(())
    }

    /// Splits the artifact into shareable parts for the window scanner.
    pub fn into_parts(self) -> (FeatureParams, Arc<dyn FeatureScaler>, Arc<dyn Classifier>) {
        (
            self.params,
            Arc::new(self.scaler),
            Arc::new(self.classifier),
        )
    }
}
