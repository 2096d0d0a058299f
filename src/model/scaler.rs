//! Standardization exported from the training pipeline as `{"mean": [..], "scale": [..]}`.

use super::Scaler;
use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self, ModelError> {
        if mean.len() != scale.len() {
            return Err(ModelError::DimensionMismatch {
                expected: mean.len(),
                actual: scale.len(),
            });
        }
        Ok(Self { mean, scale })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read_to_string(path).map_err(|e| ModelError::Load {
            reason: e.to_string(),
        })?;
        let parsed: StandardScaler = serde_json::from_str(&data).map_err(|e| ModelError::Load {
            reason: e.to_string(),
        })?;
        Self::new(parsed.mean, parsed.scale)
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.dim() {
            return Err(ModelError::DimensionMismatch {
                expected: self.dim(),
                actual: features.len(),
            });
        }
        let out: Vec<f64> = features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                // zero-variance columns are left unscaled
                let s = if *s == 0.0 { 1.0 } else { *s };
                (x - m) / s
            })
            .collect();
        if out.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Inference {
                reason: "scaled value is not finite".to_string(),
            });
        }
        Ok(out)
    }
}
