use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prediction::{FeatureRecord, SeverityPrediction};

/// Stored prediction. Append-only: never edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub severity: String,
    pub probabilities: BTreeMap<String, f64>,
    pub input_data: FeatureRecord,
    #[serde(default)]
    pub patient_id: Option<String>,
}

impl Prediction {
    pub fn new(
        username: &str,
        outcome: SeverityPrediction,
        input_data: FeatureRecord,
        patient_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            timestamp: Utc::now(),
            severity: outcome.severity,
            probabilities: outcome.probabilities,
            input_data,
            patient_id,
        }
    }
}
