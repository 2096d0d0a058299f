//! Persistence of every prediction request with its engineered features.

mod encrypted;

pub use encrypted::RequestStore;

use crate::errors::StoreError;
use crate::features::EngineeredFeatures;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One stored request: tracking identifiers plus the full feature map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRequest {
    pub request_id: String,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub features: EngineeredFeatures,
}

/// Destination for request records. Failures never affect the prediction response.
pub trait PersistenceSink: Send + Sync {
    /// Store a record and return its row id.
    fn store(&self, record: &StoredRequest) -> Result<i64, StoreError>;
}
