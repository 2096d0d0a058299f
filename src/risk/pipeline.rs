//! Scale → classify → probability → risk level, each stage with its own fallback.
//!
//! Stage failures never leave the pipeline. The one reported failure is a
//! missing scaler or classifier, checked before any stage runs.

use crate::errors::{PredictError, StageError};
use crate::features::{EngineeredFeatures, FeatureVector};
use crate::model::{Classifier, ModelBundle, Scaler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Label used when classification fails.
pub const NEUTRAL_LABEL: i64 = 0;
/// Probability used when classification fails.
pub const NEUTRAL_PROBABILITY: f64 = 0.5;
/// Heuristic probability for label 1 when the classifier has no probabilities.
pub const HEURISTIC_HIGH_PROBABILITY: f64 = 0.7;
/// Heuristic probability for any other label.
pub const HEURISTIC_LOW_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::High => "High",
        }
    }
}

/// Which path a stage took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Primary,
    Fallback,
    /// Not run because an earlier stage fell back
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTrace {
    pub scaling: StageOutcome,
    pub classification: StageOutcome,
    pub probability: StageOutcome,
}

impl PipelineTrace {
    pub fn is_degraded(&self) -> bool {
        [self.scaling, self.classification, self.probability]
            .iter()
            .any(|s| *s != StageOutcome::Primary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub risk_level: RiskLevel,
    pub risk_probability: f64,
    pub label: i64,
    pub features: EngineeredFeatures,
    pub trace: PipelineTrace,
}

/// Scaler and classifier pair; both must be present to predict.
#[derive(Clone, Default)]
pub struct PredictionPipeline {
    scaler: Option<Arc<dyn Scaler>>,
    classifier: Option<Arc<dyn Classifier>>,
}

impl From<ModelBundle> for PredictionPipeline {
    fn from(bundle: ModelBundle) -> Self {
        Self {
            scaler: bundle.scaler,
            classifier: bundle.classifier,
        }
    }
}

impl PredictionPipeline {
    pub fn new(scaler: Option<Arc<dyn Scaler>>, classifier: Option<Arc<dyn Classifier>>) -> Self {
        Self { scaler, classifier }
    }

    pub fn is_ready(&self) -> bool {
        self.ensure_ready().is_ok()
    }

    pub fn ensure_ready(&self) -> Result<(), PredictError> {
        if self.classifier.is_none() {
            return Err(PredictError::ServiceUnavailable { component: "model" });
        }
        if self.scaler.is_none() {
            return Err(PredictError::ServiceUnavailable { component: "scaler" });
        }
        Ok(())
    }

    pub fn predict(
        &self,
        vector: &FeatureVector,
        features: EngineeredFeatures,
    ) -> Result<PredictionResult, PredictError> {
        predict(vector, features, self.scaler.as_deref(), self.classifier.as_deref())
    }
}

/// Run the fallback chain for one feature vector.
pub fn predict(
    vector: &FeatureVector,
    features: EngineeredFeatures,
    scaler: Option<&dyn Scaler>,
    classifier: Option<&dyn Classifier>,
) -> Result<PredictionResult, PredictError> {
    let classifier = classifier.ok_or(PredictError::ServiceUnavailable { component: "model" })?;
    let scaler = scaler.ok_or(PredictError::ServiceUnavailable { component: "scaler" })?;

    let (input, scaling) = match scale(scaler, vector) {
        Ok(scaled) => (scaled, StageOutcome::Primary),
        Err(e) => {
            warn!(error = %e, "using raw features");
            (vector.as_slice().to_vec(), StageOutcome::Fallback)
        }
    };

    let (label, classification) = match classify(classifier, &input) {
        Ok(label) => (label, StageOutcome::Primary),
        Err(e) => {
            warn!(error = %e, "using neutral prediction");
            (NEUTRAL_LABEL, StageOutcome::Fallback)
        }
    };

    let (risk_probability, probability) = if classification == StageOutcome::Fallback {
        (NEUTRAL_PROBABILITY, StageOutcome::Skipped)
    } else {
        match probability_of_high(classifier, &input) {
            Ok(p) => (p, StageOutcome::Primary),
            Err(e) => {
                warn!(error = %e, label, "using heuristic probability");
                (heuristic_probability(label), StageOutcome::Fallback)
            }
        }
    };

    let risk_level = RiskLevel::from_label(label);
    debug!(
        risk_level = risk_level.as_str(),
        risk_probability,
        label,
        ?scaling,
        ?classification,
        ?probability,
        "prediction complete"
    );

    Ok(PredictionResult {
        risk_level,
        risk_probability,
        label,
        features,
        trace: PipelineTrace {
            scaling,
            classification,
            probability,
        },
    })
}

/// Fixed probability derived from the label alone.
pub fn heuristic_probability(label: i64) -> f64 {
    if label == 1 {
        HEURISTIC_HIGH_PROBABILITY
    } else {
        HEURISTIC_LOW_PROBABILITY
    }
}

fn scale(scaler: &dyn Scaler, vector: &FeatureVector) -> Result<Vec<f64>, StageError> {
    let scaled = scaler.transform(vector.as_slice()).map_err(StageError::Scale)?;
    if scaled.len() != vector.len() {
        return Err(StageError::Scale(crate::errors::ModelError::DimensionMismatch {
            expected: vector.len(),
            actual: scaled.len(),
        }));
    }
    Ok(scaled)
}

fn classify(classifier: &dyn Classifier, input: &[f64]) -> Result<i64, StageError> {
    classifier.predict(input).map_err(StageError::Classify)
}

fn probability_of_high(classifier: &dyn Classifier, input: &[f64]) -> Result<f64, StageError> {
    let [_, p1] = classifier
        .predict_proba(input)
        .map_err(StageError::Probability)?;
    if !(0.0..=1.0).contains(&p1) {
        return Err(StageError::InvalidProbability { value: p1 });
    }
    Ok(p1)
}
