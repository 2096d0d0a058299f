//! Burnout risk prediction from engineered features.

mod pipeline;

pub use pipeline::{
    heuristic_probability, predict, PipelineTrace, PredictionPipeline, PredictionResult,
    RiskLevel, StageOutcome, HEURISTIC_HIGH_PROBABILITY, HEURISTIC_LOW_PROBABILITY,
    NEUTRAL_LABEL, NEUTRAL_PROBABILITY,
};
