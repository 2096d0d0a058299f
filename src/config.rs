//! Service configuration: JSON file with environment overrides for deployment paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trained scaler and classifier
    pub model: ModelConfig,
    /// Reference dataset for median thresholds
    pub thresholds: ThresholdsConfig,
    /// Request store
    pub storage: StorageConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// ONNX classifier exported from the training pipeline
    pub classifier_path: PathBuf,
    /// Fitted standard scaler (JSON: mean, scale)
    pub scaler_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    /// Datasets tried in order; first readable one wins
    pub dataset_paths: Vec<PathBuf>,
    pub fallback_median_hours: f64,
    pub fallback_median_meetings: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    /// Plain path or `sqlite:///path`
    pub database_url: String,
    /// Secret the name-column key is derived from
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            thresholds: ThresholdsConfig::default(),
            storage: StorageConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: PathBuf::from("models/best_model.onnx"),
            scaler_path: PathBuf::from("models/preprocessor.json"),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            dataset_paths: vec![
                PathBuf::from("data/work_from_home_burnout_dataset.csv"),
                PathBuf::from("data/work_from_home_burnout_dataset_transformed.csv"),
            ],
            fallback_median_hours: 8.0,
            fallback_median_meetings: 3.0,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: "sqlite:///./user_requests.db".to_string(),
            secret: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl StorageConfig {
    /// Filesystem path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        let url = self.database_url.as_str();
        let path = url
            .strip_prefix("sqlite:///")
            .or_else(|| url.strip_prefix("sqlite://"))
            .unwrap_or(url);
        PathBuf::from(path)
    }
}

impl AppConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<AppConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults")
                }
            }
        }
        Self::default()
    }

    /// Apply `MODEL_PATH`, `PREPROCESSOR_PATH`, `DATA_PATH`, `DATABASE_URL`
    /// and `BURNOUT_STORE_SECRET` from the given lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = lookup("MODEL_PATH") {
            self.model.classifier_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("PREPROCESSOR_PATH") {
            self.model.scaler_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("DATA_PATH") {
            // an explicit dataset replaces the raw one but keeps the transformed fallback
            let mut paths = vec![PathBuf::from(p)];
            paths.extend(self.thresholds.dataset_paths.into_iter().skip(1));
            self.thresholds.dataset_paths = paths;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = url;
        }
        if let Some(secret) = lookup("BURNOUT_STORE_SECRET") {
            self.storage.secret = Some(secret);
        }
        self
    }

    /// File config plus process environment.
    pub fn from_env(path: &Path) -> Self {
        Self::load(path).with_env_overrides(|k| std::env::var(k).ok())
    }
}
