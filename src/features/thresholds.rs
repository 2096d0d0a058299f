//! Median work-hours / meetings thresholds from the reference dataset.

use crate::config::ThresholdsConfig;
use crate::errors::ThresholdError;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

static SHARED: OnceLock<Thresholds> = OnceLock::new();

pub const DEFAULT_MEDIAN_HOURS: f64 = 8.0;
pub const DEFAULT_MEDIAN_MEETINGS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub median_hours: f64,
    pub median_meetings: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            median_hours: DEFAULT_MEDIAN_HOURS,
            median_meetings: DEFAULT_MEDIAN_MEETINGS,
        }
    }
}

impl Thresholds {
    pub fn new(median_hours: f64, median_meetings: f64) -> Self {
        Self {
            median_hours,
            median_meetings,
        }
    }

    /// Medians of `work_hours` and `meetings_count` in a CSV file with a header row.
    pub fn from_dataset(path: &Path) -> Result<Self, ThresholdError> {
        let file = File::open(path).map_err(|source| ThresholdError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_csv(data: &str) -> Result<Self, ThresholdError> {
        Self::from_reader(data.as_bytes())
    }

    /// Cells that are empty, unparseable or NaN are left out of the median.
    pub fn from_reader(reader: impl Read) -> Result<Self, ThresholdError> {
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(ThresholdError::EmptyDataset);
        }
        let hours_idx = column_index(&headers, "work_hours")?;
        let meetings_idx = column_index(&headers, "meetings_count")?;

        let mut hours = Vec::new();
        let mut meetings = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if let Some(v) = parse_cell(&record, hours_idx) {
                hours.push(v);
            }
            if let Some(v) = parse_cell(&record, meetings_idx) {
                meetings.push(v);
            }
        }

        Ok(Self {
            median_hours: median(&mut hours).ok_or_else(|| ThresholdError::NoValues {
                column: "work_hours".to_string(),
            })?,
            median_meetings: median(&mut meetings).ok_or_else(|| ThresholdError::NoValues {
                column: "meetings_count".to_string(),
            })?,
        })
    }

    /// First readable dataset in `config.dataset_paths`, else the configured fallbacks.
    pub fn load(config: &ThresholdsConfig) -> Self {
        for path in &config.dataset_paths {
            match Self::from_dataset(path) {
                Ok(t) => {
                    tracing::info!(
                        path = %path.display(),
                        median_hours = t.median_hours,
                        median_meetings = t.median_meetings,
                        "median thresholds loaded"
                    );
                    return t;
                }
                Err(e) => tracing::debug!(path = %path.display(), error = %e, "dataset unusable"),
            }
        }
        tracing::warn!(
            median_hours = config.fallback_median_hours,
            median_meetings = config.fallback_median_meetings,
            "no reference dataset; using fallback thresholds"
        );
        Self::new(config.fallback_median_hours, config.fallback_median_meetings)
    }

    /// Process-wide thresholds, computed on first call only.
    pub fn shared(config: &ThresholdsConfig) -> &'static Thresholds {
        SHARED.get_or_init(|| Self::load(config))
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, ThresholdError> {
    headers
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| ThresholdError::MissingColumn {
            column: name.to_string(),
        })
}

fn parse_cell(record: &StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .and_then(|c| c.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
