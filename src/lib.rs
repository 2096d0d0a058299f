//! Burnout risk prediction from daily work-habit metrics.
//!
//! Modular structure:
//! - [`features`] — Raw metrics to the 17-feature model vector and 23-entry feature map
//! - [`model`] — Scaler / classifier capabilities, ONNX classifier
//! - [`risk`] — Prediction pipeline with per-stage fallbacks
//! - [`storage`] — SQLite request store
//! - [`service`] — Validation, response assembly, persistence hand-off
//! - [`logging`] — Structured logging

pub mod config;
pub mod errors;
pub mod features;
pub mod model;
pub mod risk;
pub mod storage;
pub mod service;
pub mod logging;

pub use config::AppConfig;
pub use features::{engineer_features, EngineeredFeatures, FeatureEngineer, FeatureVector, RawMetrics, Thresholds};
pub use model::{Classifier, ModelBundle, Scaler};
pub use risk::{predict, PredictionPipeline, PredictionResult, RiskLevel};
pub use storage::{PersistenceSink, RequestStore};
pub use service::{BurnoutService, PredictionRequest, PredictionResponse};
pub use logging::StructuredLogger;
