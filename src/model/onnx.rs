//! ONNX Runtime inference for the burnout classifier. Input: [1, n] f32.
//! Outputs follow the scikit-learn exporter: a label tensor and, when the model
//! was exported without a zipmap, a [1, 2] probability tensor.

use super::Classifier;
use crate::errors::ModelError;
use ndarray::{Array2, CowArray};
use ort::tensor::OrtOwnedTensor;
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::{Arc, OnceLock};

static ORT_ENV: OnceLock<Arc<Environment>> = OnceLock::new();

fn ort_err(e: impl std::fmt::Display) -> ModelError {
    ModelError::Inference {
        reason: e.to_string(),
    }
}

fn load_err(e: impl std::fmt::Display) -> ModelError {
    ModelError::Load {
        reason: e.to_string(),
    }
}

fn init_env() -> Result<&'static Arc<Environment>, ModelError> {
    if let Some(env) = ORT_ENV.get() {
        return Ok(env);
    }
    let env = Environment::builder()
        .with_name("burnout-risk")
        .build()
        .map_err(load_err)?
        .into_arc();
    Ok(ORT_ENV.get_or_init(|| env))
}

pub struct OnnxClassifier {
    session: Session,
    label_output: usize,
    proba_output: Option<usize>,
}

impl OnnxClassifier {
    /// Load model from path. The runtime is only initialized when the file exists.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let env = init_env()?;
        let session = SessionBuilder::new(env)
            .map_err(load_err)?
            .with_optimization_level(GraphOptimizationLevel::Level1)
            .map_err(load_err)?
            .with_model_from_file(path)
            .map_err(load_err)?;

        let names: Vec<String> = session.outputs.iter().map(|o| o.name.to_lowercase()).collect();
        let label_output = names.iter().position(|n| n.contains("label")).unwrap_or(0);
        let proba_output = names
            .iter()
            .position(|n| n.contains("probab"))
            .or_else(|| (names.len() > 1).then_some(1))
            .filter(|idx| *idx != label_output);

        Ok(Self {
            session,
            label_output,
            proba_output,
        })
    }

    /// Run one row through the session and hand the outputs to `extract`.
    fn run<T>(
        &self,
        features: &[f64],
        extract: impl FnOnce(&[Value<'_>]) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        let input: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let arr = Array2::from_shape_vec((1, input.len()), input).map_err(ort_err)?;
        let array = CowArray::from(arr).into_dyn();
        let value = Value::from_array(self.session.allocator(), &array).map_err(ort_err)?;
        let outputs = self.session.run(vec![value]).map_err(ort_err)?;
        extract(&outputs)
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        self.run(features, |outputs| {
            let out = outputs.get(self.label_output).ok_or_else(|| ort_err("missing label output"))?;
            let as_int: Result<OrtOwnedTensor<i64, _>, _> = out.try_extract();
            if let Ok(labels) = as_int {
                let label = labels.view().iter().next().copied();
                return label.ok_or_else(|| ort_err("empty label tensor"));
            }
            // some exporters emit float labels
            let labels: OrtOwnedTensor<f32, _> = out.try_extract().map_err(ort_err)?;
            let label = labels.view().iter().next().copied();
            label
                .map(|l| l.round() as i64)
                .ok_or_else(|| ort_err("empty label tensor"))
        })
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ModelError> {
        let idx = self.proba_output.ok_or(ModelError::ProbabilityUnsupported)?;
        self.run(features, |outputs| {
            let out = outputs.get(idx).ok_or(ModelError::ProbabilityUnsupported)?;
            let probs: OrtOwnedTensor<f32, _> = out.try_extract().map_err(ort_err)?;
            let view = probs.view();
            let mut it = view.iter().copied();
            match (it.next(), it.next()) {
                (Some(p0), Some(p1)) => Ok([f64::from(p0), f64::from(p1)]),
                _ => Err(ort_err("probability tensor has fewer than 2 values")),
            }
        })
    }
}
