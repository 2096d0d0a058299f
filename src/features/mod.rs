//! Feature engineering: raw work-habit metrics to the fixed-order model vector.

mod engineer;
mod thresholds;

pub use engineer::{engineer_features, FeatureEngineer};
pub use thresholds::Thresholds;

use serde::{Deserialize, Serialize};

/// Number of features the classifier was trained on.
pub const FEATURE_COUNT: usize = 17;

/// Model input order. Must match the column order used in training.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "work_hours",
    "screen_time_hours",
    "meetings_count",
    "breaks_taken",
    "after_hours_work",
    "sleep_hours",
    "task_completion_rate",
    "is_weekday",
    "work_intensity_ratio",
    "meeting_burden",
    "break_adequacy",
    "sleep_deficit",
    "recovery_index",
    "fatigue_risk",
    "workload_pressure",
    "task_efficiency",
    "work_life_balance_score",
];

/// Display/storage metrics that never reach the model.
pub const DERIVED_FEATURE_NAMES: [&str; 6] = [
    "screen_time_per_meeting",
    "work_hours_productivity",
    "health_risk_score",
    "after_hours_work_hours_est",
    "high_workload_flag",
    "poor_recovery_flag",
];

/// Total entries in [`EngineeredFeatures`].
pub const FEATURE_MAP_LEN: usize = FEATURE_COUNT + DERIVED_FEATURE_NAMES.len();

/// User-reported daily metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub work_hours: f64,
    pub screen_time_hours: f64,
    pub meetings_count: i64,
    pub breaks_taken: i64,
    pub after_hours_work: i64,
    pub sleep_hours: f64,
    pub task_completion_rate: f64,
    /// "Weekday" or "Weekend", case-insensitive
    pub day_type: String,
}

impl RawMetrics {
    /// 1 for a weekday, 0 for anything else (unknown strings included).
    pub fn is_weekday(&self) -> u8 {
        u8::from(self.day_type.to_lowercase() == "weekday")
    }
}

/// Model input vector in [`FEATURE_NAMES`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Every input and derived metric for one request, in response/storage order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeredFeatures {
    pub work_hours: f64,
    pub screen_time_hours: f64,
    pub meetings_count: i64,
    pub breaks_taken: i64,
    pub after_hours_work: i64,
    pub sleep_hours: f64,
    pub task_completion_rate: f64,
    pub is_weekday: u8,
    pub work_intensity_ratio: f64,
    pub meeting_burden: f64,
    pub break_adequacy: f64,
    pub sleep_deficit: f64,
    pub recovery_index: f64,
    pub fatigue_risk: f64,
    pub workload_pressure: f64,
    pub task_efficiency: f64,
    pub work_life_balance_score: f64,
    pub screen_time_per_meeting: f64,
    pub work_hours_productivity: f64,
    pub health_risk_score: f64,
    pub after_hours_work_hours_est: f64,
    pub high_workload_flag: u8,
    pub poor_recovery_flag: u8,
}

impl EngineeredFeatures {
    /// All `(name, value)` pairs: model features first, then derived metrics.
    pub fn entries(&self) -> [(&'static str, f64); FEATURE_MAP_LEN] {
        [
            ("work_hours", self.work_hours),
            ("screen_time_hours", self.screen_time_hours),
            ("meetings_count", self.meetings_count as f64),
            ("breaks_taken", self.breaks_taken as f64),
            ("after_hours_work", self.after_hours_work as f64),
            ("sleep_hours", self.sleep_hours),
            ("task_completion_rate", self.task_completion_rate),
            ("is_weekday", f64::from(self.is_weekday)),
            ("work_intensity_ratio", self.work_intensity_ratio),
            ("meeting_burden", self.meeting_burden),
            ("break_adequacy", self.break_adequacy),
            ("sleep_deficit", self.sleep_deficit),
            ("recovery_index", self.recovery_index),
            ("fatigue_risk", self.fatigue_risk),
            ("workload_pressure", self.workload_pressure),
            ("task_efficiency", self.task_efficiency),
            ("work_life_balance_score", self.work_life_balance_score),
            ("screen_time_per_meeting", self.screen_time_per_meeting),
            ("work_hours_productivity", self.work_hours_productivity),
            ("health_risk_score", self.health_risk_score),
            ("after_hours_work_hours_est", self.after_hours_work_hours_est),
            ("high_workload_flag", f64::from(self.high_workload_flag)),
            ("poor_recovery_flag", f64::from(self.poor_recovery_flag)),
        ]
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Model vector: the first [`FEATURE_COUNT`] entries.
    pub fn to_vector(&self) -> FeatureVector {
        let entries = self.entries();
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, (_, v)) in values.iter_mut().zip(entries.iter()) {
            *slot = *v;
        }
        FeatureVector { values }
    }
}
