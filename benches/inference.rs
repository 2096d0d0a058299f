//! Prediction benchmark: feature vector → scaler → classifier, primary and fallback paths.

use burnout_risk::errors::ModelError;
use burnout_risk::features::{engineer_features, RawMetrics, Thresholds};
use burnout_risk::model::{Classifier, Scaler, StandardScaler};
use burnout_risk::risk::predict;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

struct ThresholdClassifier;

impl Classifier for ThresholdClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        Ok(i64::from(features.iter().sum::<f64>() > 0.0))
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ModelError> {
        let p = 1.0 / (1.0 + (-features.iter().sum::<f64>()).exp());
        Ok([1.0 - p, p])
    }
}

struct FailingScaler;

impl Scaler for FailingScaler {
    fn transform(&self, _features: &[f64]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::ProbabilityUnsupported)
    }
}

fn sample() -> RawMetrics {
    RawMetrics {
        work_hours: 9.0,
        screen_time_hours: 8.0,
        meetings_count: 5,
        breaks_taken: 2,
        after_hours_work: 1,
        sleep_hours: 6.5,
        task_completion_rate: 85.0,
        day_type: "Weekday".to_string(),
    }
}

fn bench_predict(c: &mut Criterion) {
    let (vector, features) = engineer_features(&sample(), &Thresholds::default());
    let scaler = StandardScaler::new(vec![5.0; 17], vec![2.0; 17]).unwrap();

    c.bench_function("predict_standard_scaler", |b| {
        b.iter(|| {
            predict(
                black_box(&vector),
                features.clone(),
                Some(&scaler),
                Some(&ThresholdClassifier),
            )
        })
    });
}

fn bench_predict_fallback(c: &mut Criterion) {
    let (vector, features) = engineer_features(&sample(), &Thresholds::default());

    c.bench_function("predict_raw_fallback", |b| {
        b.iter(|| {
            predict(
                black_box(&vector),
                features.clone(),
                Some(&FailingScaler),
                Some(&ThresholdClassifier),
            )
        })
    });
}

criterion_group!(benches, bench_predict, bench_predict_fallback);
criterion_main!(benches);
