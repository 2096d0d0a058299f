//! Prediction pipeline: primary path, each fallback, and the unloaded-model precondition.

use burnout_risk::errors::{ModelError, PredictError};
use burnout_risk::features::{engineer_features, RawMetrics, Thresholds};
use burnout_risk::model::{Classifier, ModelBundle, Scaler, StandardScaler};
use burnout_risk::risk::{predict, PredictionPipeline, RiskLevel, StageOutcome};
use std::sync::{Arc, Mutex};

struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(features.to_vec())
    }
}

struct DoublingScaler;

impl Scaler for DoublingScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(features.iter().map(|v| v * 2.0).collect())
    }
}

struct FailingScaler;

impl Scaler for FailingScaler {
    fn transform(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::Inference {
            reason: "scaler exploded".to_string(),
        })
    }
}

struct TruncatingScaler;

impl Scaler for TruncatingScaler {
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(features[..3].to_vec())
    }
}

/// Fixed output; records the row it was given.
struct FixedClassifier {
    label: i64,
    proba: Option<[f64; 2]>,
    seen: Mutex<Vec<f64>>,
}

impl FixedClassifier {
    fn new(label: i64, proba: Option<[f64; 2]>) -> Self {
        Self {
            label,
            proba,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Classifier for FixedClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        *self.seen.lock().unwrap() = features.to_vec();
        Ok(self.label)
    }

    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ModelError> {
        self.proba.ok_or(ModelError::ProbabilityUnsupported)
    }
}

/// Implements only `predict`; probabilities come from the trait default.
struct LabelOnlyClassifier(i64);

impl Classifier for LabelOnlyClassifier {
    fn predict(&self, _features: &[f64]) -> Result<i64, ModelError> {
        Ok(self.0)
    }
}

struct FailingClassifier;

impl Classifier for FailingClassifier {
    fn predict(&self, _features: &[f64]) -> Result<i64, ModelError> {
        Err(ModelError::Inference {
            reason: "model exploded".to_string(),
        })
    }

    fn predict_proba(&self, _features: &[f64]) -> Result<[f64; 2], ModelError> {
        Ok([0.0, 1.0])
    }
}

fn overloaded_day() -> RawMetrics {
    RawMetrics {
        work_hours: 14.0,
        screen_time_hours: 13.0,
        meetings_count: 10,
        breaks_taken: 0,
        after_hours_work: 1,
        sleep_hours: 4.0,
        task_completion_rate: 50.0,
        day_type: "Weekday".to_string(),
    }
}

#[test]
fn end_to_end_high_risk() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let classifier = FixedClassifier::new(1, Some([0.2, 0.8]));
    let result = predict(&vector, features.clone(), Some(&IdentityScaler), Some(&classifier)).unwrap();
    assert_eq!(result.risk_level, RiskLevel::High);
    assert_eq!(result.risk_probability, 0.8);
    assert_eq!(result.label, 1);
    assert_eq!(result.features, features);
    assert!(!result.trace.is_degraded());
}

#[test]
fn scaled_vector_reaches_classifier() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let classifier = FixedClassifier::new(0, Some([0.9, 0.1]));
    let result = predict(&vector, features, Some(&DoublingScaler), Some(&classifier)).unwrap();
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert_eq!(result.trace.scaling, StageOutcome::Primary);
    let seen = classifier.seen.lock().unwrap().clone();
    assert_eq!(seen[0], 28.0);
}

#[test]
fn failing_scaler_falls_back_to_raw_features() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let classifier = FixedClassifier::new(1, Some([0.3, 0.7]));
    let result = predict(&vector, features, Some(&FailingScaler), Some(&classifier)).unwrap();
    assert_eq!(result.trace.scaling, StageOutcome::Fallback);
    assert_eq!(result.trace.classification, StageOutcome::Primary);
    assert_eq!(*classifier.seen.lock().unwrap(), vector.as_slice().to_vec());
    assert_eq!(result.risk_level, RiskLevel::High);
}

#[test]
fn wrong_length_scaler_output_falls_back_to_raw_features() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let classifier = FixedClassifier::new(0, Some([0.6, 0.4]));
    let result = predict(&vector, features, Some(&TruncatingScaler), Some(&classifier)).unwrap();
    assert_eq!(result.trace.scaling, StageOutcome::Fallback);
    assert_eq!(classifier.seen.lock().unwrap().len(), 17);
}

#[test]
fn missing_probabilities_use_label_heuristic() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());

    let high = predict(&vector, features.clone(), Some(&IdentityScaler), Some(&LabelOnlyClassifier(1))).unwrap();
    assert_eq!(high.risk_probability, 0.7);
    assert_eq!(high.risk_level, RiskLevel::High);
    assert_eq!(high.trace.probability, StageOutcome::Fallback);

    let low = predict(&vector, features, Some(&IdentityScaler), Some(&LabelOnlyClassifier(0))).unwrap();
    assert_eq!(low.risk_probability, 0.3);
    assert_eq!(low.risk_level, RiskLevel::Low);
}

#[test]
fn out_of_range_probability_uses_label_heuristic() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    for bad in [1.5, -0.1, f64::NAN] {
        let classifier = FixedClassifier::new(1, Some([0.0, bad]));
        let result = predict(&vector, features.clone(), Some(&IdentityScaler), Some(&classifier)).unwrap();
        assert_eq!(result.risk_probability, 0.7);
        assert_eq!(result.trace.probability, StageOutcome::Fallback);
    }
}

#[test]
fn failing_classifier_returns_neutral_prediction() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let result = predict(&vector, features, Some(&IdentityScaler), Some(&FailingClassifier)).unwrap();
    assert_eq!(result.label, 0);
    assert_eq!(result.risk_probability, 0.5);
    assert_eq!(result.risk_level, RiskLevel::Low);
    assert_eq!(result.trace.classification, StageOutcome::Fallback);
    assert_eq!(result.trace.probability, StageOutcome::Skipped);
}

#[test]
fn probability_in_unit_interval_on_every_path() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let scalers: [&dyn Scaler; 3] = [&IdentityScaler, &FailingScaler, &TruncatingScaler];
    let fixed = FixedClassifier::new(1, Some([0.25, 0.75]));
    let classifiers: [&dyn Classifier; 4] = [&fixed, &LabelOnlyClassifier(1), &LabelOnlyClassifier(0), &FailingClassifier];
    for scaler in scalers {
        for classifier in classifiers {
            let result = predict(&vector, features.clone(), Some(scaler), Some(classifier)).unwrap();
            assert!((0.0..=1.0).contains(&result.risk_probability));
        }
    }
}

#[test]
fn unloaded_model_is_reported() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let err = predict(&vector, features.clone(), Some(&IdentityScaler), None).unwrap_err();
    assert!(matches!(err, PredictError::ServiceUnavailable { component: "model" }));
    let err = predict(&vector, features.clone(), None, Some(&LabelOnlyClassifier(1))).unwrap_err();
    assert!(matches!(err, PredictError::ServiceUnavailable { component: "scaler" }));

    let pipeline = PredictionPipeline::default();
    assert!(!pipeline.is_ready());
    assert!(pipeline.predict(&vector, features).is_err());
}

#[test]
fn pipeline_from_bundle() {
    let (vector, features) = engineer_features(&overloaded_day(), &Thresholds::default());
    let bundle = ModelBundle::new(
        Arc::new(StandardScaler::new(vec![0.0; 17], vec![1.0; 17]).unwrap()),
        Arc::new(FixedClassifier::new(1, Some([0.1, 0.9]))),
    );
    assert!(bundle.is_loaded());
    let pipeline = PredictionPipeline::from(bundle);
    assert!(pipeline.is_ready());
    let result = pipeline.predict(&vector, features).unwrap();
    assert_eq!(result.risk_level, RiskLevel::High);
    assert_eq!(result.risk_probability, 0.9);
}

#[test]
fn standard_scaler_transform() {
    let scaler = StandardScaler::new(vec![1.0, 2.0, 3.0], vec![2.0, 0.0, 0.5]).unwrap();
    let out = scaler.transform(&[3.0, 5.0, 4.0]).unwrap();
    assert_eq!(out, vec![1.0, 3.0, 2.0]);
    assert!(matches!(
        scaler.transform(&[1.0]),
        Err(ModelError::DimensionMismatch { expected: 3, actual: 1 })
    ));
    assert!(StandardScaler::new(vec![0.0; 2], vec![1.0; 3]).is_err());
}
