//! Scaler and classifier capabilities plus the loader that provides them.

mod onnx;
mod scaler;

pub use onnx::OnnxClassifier;
pub use scaler::StandardScaler;

use crate::config::ModelConfig;
use crate::errors::ModelError;
use std::sync::Arc;

/// Fitted normalization applied before inference.
pub trait Scaler: Send + Sync {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Binary classifier over a single feature row.
pub trait Classifier: Send + Sync {
    /// Predicted class label; 1 means high burnout risk.
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError>;

    /// `[p(label 0), p(label 1)]`.
    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ModelError> {
        Err(ModelError::ProbabilityUnsupported)
    }
}

/// Loaded model artifacts. A missing half means the model is not loaded.
#[derive(Clone, Default)]
pub struct ModelBundle {
    pub scaler: Option<Arc<dyn Scaler>>,
    pub classifier: Option<Arc<dyn Classifier>>,
}

impl ModelBundle {
    pub fn new(scaler: Arc<dyn Scaler>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            scaler: Some(scaler),
            classifier: Some(classifier),
        }
    }

    /// Load both artifacts; failures are logged and leave that half empty.
    pub fn load(config: &ModelConfig) -> Self {
        let scaler = match StandardScaler::load(&config.scaler_path) {
            Ok(s) => {
                tracing::info!(path = %config.scaler_path.display(), dim = s.dim(), "scaler loaded");
                Some(Arc::new(s) as Arc<dyn Scaler>)
            }
            Err(e) => {
                tracing::error!(path = %config.scaler_path.display(), error = %e, "scaler not loaded");
                None
            }
        };
        let classifier = match OnnxClassifier::load(&config.classifier_path) {
            Ok(c) => {
                tracing::info!(path = %config.classifier_path.display(), "classifier loaded");
                Some(Arc::new(c) as Arc<dyn Classifier>)
            }
            Err(e) => {
                tracing::error!(path = %config.classifier_path.display(), error = %e, "classifier not loaded");
                None
            }
        };
        Self { scaler, classifier }
    }

    pub fn is_loaded(&self) -> bool {
        self.scaler.is_some() && self.classifier.is_some()
    }
}
