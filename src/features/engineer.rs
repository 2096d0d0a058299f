//! Raw metrics → engineered features. Formulas must stay identical to the
//! dataset transform the classifier was trained on, `+0.1` offsets included.

use super::{EngineeredFeatures, FeatureVector, RawMetrics, Thresholds};

/// Stateless engineer bound to a fixed set of median thresholds.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEngineer {
    thresholds: Thresholds,
}

impl FeatureEngineer {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn engineer(&self, raw: &RawMetrics) -> (FeatureVector, EngineeredFeatures) {
        engineer_features(raw, &self.thresholds)
    }
}

/// Compute the model vector and the full feature map for one set of metrics.
pub fn engineer_features(
    raw: &RawMetrics,
    thresholds: &Thresholds,
) -> (FeatureVector, EngineeredFeatures) {
    let wh = raw.work_hours;
    let st = raw.screen_time_hours;
    let mt = raw.meetings_count as f64;
    let br = raw.breaks_taken as f64;
    let ah = raw.after_hours_work as f64;
    let sl = raw.sleep_hours;
    let tr = raw.task_completion_rate;

    let recovery_index = (sl + br) - st;
    let fatigue_risk = st - sl * 1.5;
    let work_life_balance_score = clip(
        ((sl / 8.0) * 30.0 + (br / 5.0) * 30.0 - (wh / 10.0) * 20.0 - ah * 10.0) * 2.0,
        0.0,
        100.0,
    );
    let health_risk_score = clip(
        (1.0 - sl / 8.0) * 40.0 + fatigue_risk.max(0.0) * 10.0,
        0.0,
        100.0,
    );
    let high_workload = wh > thresholds.median_hours && mt > thresholds.median_meetings;
    let poor_recovery = sl < 6.0 && recovery_index < 0.0;

    let features = EngineeredFeatures {
        work_hours: wh,
        screen_time_hours: st,
        meetings_count: raw.meetings_count,
        breaks_taken: raw.breaks_taken,
        after_hours_work: raw.after_hours_work,
        sleep_hours: sl,
        task_completion_rate: tr,
        is_weekday: raw.is_weekday(),
        work_intensity_ratio: st / (wh + 0.1),
        meeting_burden: mt / (wh + 0.1),
        break_adequacy: br / (wh + 0.1),
        sleep_deficit: 8.0 - sl,
        recovery_index,
        fatigue_risk,
        workload_pressure: wh + mt * 0.25 + ah,
        task_efficiency: tr / (wh + 0.1),
        work_life_balance_score,
        screen_time_per_meeting: st / (mt + 0.1),
        // unscaled, matching the training dataset transform
        work_hours_productivity: tr * (1.0 - wh / 15.0),
        health_risk_score,
        after_hours_work_hours_est: ah * (wh * 0.1),
        high_workload_flag: u8::from(high_workload),
        poor_recovery_flag: u8::from(poor_recovery),
    };

    (features.to_vector(), features)
}

/// Clamp into `[lo, hi]`; NaN propagates like numpy's clip.
fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    if x.is_nan() {
        x
    } else {
        x.max(lo).min(hi)
    }
}
