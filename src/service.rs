//! Request handling around the core: validation, engineering, prediction,
//! response assembly, and best-effort persistence.

use crate::errors::{ServiceError, ValidationError};
use crate::features::{EngineeredFeatures, FeatureEngineer, RawMetrics, FEATURE_COUNT};
use crate::risk::{PredictionPipeline, RiskLevel};
use crate::storage::{PersistenceSink, StoredRequest};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Incoming prediction request: metrics plus tracking identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(flatten)]
    pub metrics: RawMetrics,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl PredictionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let m = &self.metrics;
        check_range("work_hours", m.work_hours, 0.0, 24.0)?;
        check_range("screen_time_hours", m.screen_time_hours, 0.0, 24.0)?;
        check_range("meetings_count", m.meetings_count as f64, 0.0, 20.0)?;
        check_range("breaks_taken", m.breaks_taken as f64, 0.0, 10.0)?;
        check_range("after_hours_work", m.after_hours_work as f64, 0.0, 1.0)?;
        check_range("sleep_hours", m.sleep_hours, 0.0, 12.0)?;
        check_range("task_completion_rate", m.task_completion_rate, 0.0, 100.0)?;

        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if !present(&self.name) && !present(&self.user_id) {
            return Err(ValidationError::MissingIdentity);
        }
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

/// Feature map as returned to the caller, with the tracking identifiers attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFeatures {
    #[serde(flatten)]
    pub features: EngineeredFeatures,
    pub name: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_level: RiskLevel,
    pub risk_probability: f64,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub features: ResponseFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub features: String,
}

pub struct BurnoutService {
    engineer: FeatureEngineer,
    pipeline: PredictionPipeline,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl BurnoutService {
    pub fn new(engineer: FeatureEngineer, pipeline: PredictionPipeline) -> Self {
        Self {
            engineer,
            pipeline,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ServiceError> {
        request.validate()?;
        self.pipeline.ensure_ready()?;

        let request_id = Uuid::new_v4().to_string();
        let (vector, features) = self.engineer.engineer(&request.metrics);
        let result = self.pipeline.predict(&vector, features)?;

        info!(
            request_id = %request_id,
            risk_level = result.risk_level.as_str(),
            risk_probability = result.risk_probability,
            degraded = result.trace.is_degraded(),
            "prediction"
        );

        let now = Utc::now();
        if let Some(sink) = &self.sink {
            let record = StoredRequest {
                request_id: request_id.clone(),
                user_id: request.user_id.clone(),
                name: request.name.clone(),
                created_at: now,
                features: result.features.clone(),
            };
            match sink.store(&record) {
                Ok(row_id) => info!(request_id = %request_id, row_id, "request stored"),
                Err(e) => error!(request_id = %request_id, error = %e, "request not stored"),
            }
        }

        Ok(PredictionResponse {
            risk_level: result.risk_level,
            risk_probability: result.risk_probability,
            timestamp: now.to_rfc3339(),
            features: ResponseFeatures {
                features: result.features,
                name: request.name.clone(),
                user_id: request.user_id.clone(),
            },
        })
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            model_loaded: self.pipeline.is_ready(),
        }
    }

    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            message: "Burnout Risk Prediction".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: format!("{FEATURE_COUNT} engineered features for prediction"),
        }
    }
}
