//! COPD severity prediction.
//!
//! Wraps three artifacts trained offline (standard scaler, random-forest
//! classifier, label encoder). They are loaded and cross-checked once at
//! startup, then shared read-only across requests.

pub mod artifacts;
pub mod encoder;
pub mod features;
pub mod forest;
pub mod scaler;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use artifacts::{ArtifactError, ArtifactPaths};
pub use encoder::LabelEncoder;
pub use features::{FeatureRecord, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{Classifier, RandomForest};
pub use scaler::StandardScaler;

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("Missing required fields: [{}]", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid value for {field}: {reason}")]
    InvalidFeature { field: &'static str, reason: String },

    #[error("Feature vector has {actual} columns, model expects {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Classifier produced class index {0} unknown to the label encoder")]
    UnknownClass(usize),
}

impl PredictionError {
    /// Whether the caller sent bad input (as opposed to a model fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictionError::MissingFields(_) | PredictionError::InvalidFeature { .. }
        )
    }
}

/// Predicted severity plus the per-class distribution, rounded to 3 places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityPrediction {
    pub severity: String,
    pub probabilities: BTreeMap<String, f64>,
}

pub struct PredictionService {
    scaler: StandardScaler,
    encoder: LabelEncoder,
    classifier: Box<dyn Classifier>,
}

impl PredictionService {
    /// Assemble a service, checking the artifacts agree with each other
    /// and with the 18-column feature schema.
    pub fn new(
        scaler: StandardScaler,
        encoder: LabelEncoder,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ArtifactError> {
        if scaler.width() != FEATURE_COUNT {
            return Err(ArtifactError::Invalid {
                artifact: "scaler",
                reason: format!("fit on {} columns, expected {FEATURE_COUNT}", scaler.width()),
            });
        }
        if classifier.n_features() != FEATURE_COUNT {
            return Err(ArtifactError::Invalid {
                artifact: "classifier",
                reason: format!(
                    "fit on {} features, expected {FEATURE_COUNT}",
                    classifier.n_features()
                ),
            });
        }
        if classifier.n_classes() != encoder.len() {
            return Err(ArtifactError::Invalid {
                artifact: "classifier",
                reason: format!(
                    "predicts {} classes but the label encoder knows {}",
                    classifier.n_classes(),
                    encoder.len()
                ),
            });
        }
        Ok(Self {
            scaler,
            encoder,
            classifier,
        })
    }

    /// Load and validate all three artifacts.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let scaler = artifacts::load_scaler(&paths.scaler)?;
        let encoder = artifacts::load_label_encoder(&paths.label_encoder)?;
        let forest = artifacts::load_forest(&paths.classifier)?;
        tracing::info!(
            trees = forest.trees.len(),
            classes = ?encoder.classes,
            classifier = %paths.classifier.display(),
            "Prediction artifacts loaded"
        );
        Self::new(scaler, encoder, Box::new(forest))
    }

    /// Severity labels known to the label encoder, in class-index order.
    pub fn classes(&self) -> &[String] {
        &self.encoder.classes
    }

    /// Scale, classify and decode one record.
    pub fn predict(&self, record: &FeatureRecord) -> Result<SeverityPrediction, PredictionError> {
        let scaled = self.scaler.transform(&record.to_row())?;
        let proba = self.classifier.predict_proba(&scaled)?;
        let class = forest::argmax(&proba);

        let severity = self
            .encoder
            .inverse_transform(class)
            .ok_or(PredictionError::UnknownClass(class))?
            .to_string();

        let probabilities = self
            .encoder
            .classes
            .iter()
            .zip(&proba)
            .map(|(label, p)| (label.clone(), round3(*p)))
            .collect();

        Ok(SeverityPrediction {
            severity,
            probabilities,
        })
    }
}

fn round3(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

/// Small hand-built artifacts shared by tests across the crate.
///
/// The forest splits on FEV1PRED (column 4) and CAT (column 7) so the
/// reference patient lands on MILD and a low-FEV1 patient on VERY SEVERE.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::Path;

    use serde_json::{json, Map, Value};

    use super::*;
    use crate::prediction::forest::DecisionTree;

    pub fn scaler() -> StandardScaler {
        let mut mean = vec![0.0; FEATURE_COUNT];
        let mut scale = vec![1.0; FEATURE_COUNT];
        mean[4] = 60.0;
        scale[4] = 20.0;
        mean[7] = 15.0;
        scale[7] = 8.0;
        StandardScaler {
            mean,
            scale,
            feature_names: Some(FEATURE_NAMES.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn encoder() -> LabelEncoder {
        LabelEncoder {
            classes: ["MILD", "MODERATE", "SEVERE", "VERY SEVERE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn forest() -> RandomForest {
        let fev1 = DecisionTree {
            children_left: vec![1, 2, -1, -1, -1],
            children_right: vec![4, 3, -1, -1, -1],
            feature: vec![4, 4, -2, -2, -2],
            threshold: vec![0.5, -0.75, -2.0, -2.0, -2.0],
            value: vec![
                vec![7.0, 6.0, 8.0, 9.0],
                vec![0.0, 3.0, 8.0, 9.0],
                vec![0.0, 0.0, 2.0, 8.0],
                vec![0.0, 3.0, 6.0, 1.0],
                vec![7.0, 3.0, 0.0, 0.0],
            ],
        };
        let cat = DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![7, -2, -2],
            threshold: vec![0.0, -2.0, -2.0],
            value: vec![
                vec![6.0, 6.0, 5.0, 3.0],
                vec![6.0, 4.0, 0.0, 0.0],
                vec![0.0, 2.0, 5.0, 3.0],
            ],
        };
        RandomForest {
            n_features: FEATURE_COUNT,
            n_classes: 4,
            trees: vec![fev1, cat],
        }
    }

    pub fn service() -> PredictionService {
        PredictionService::new(scaler(), encoder(), Box::new(forest())).unwrap()
    }

    pub fn write_artifacts(dir: &Path) -> ArtifactPaths {
        let paths = ArtifactPaths::in_dir(dir, "copd_rf_model.json", "scaler.json", "label_encoder.json");
        std::fs::write(&paths.classifier, serde_json::to_string(&forest()).unwrap()).unwrap();
        std::fs::write(&paths.scaler, serde_json::to_string(&scaler()).unwrap()).unwrap();
        std::fs::write(&paths.label_encoder, serde_json::to_string(&encoder()).unwrap()).unwrap();
        paths
    }

    /// The reference patient: FEV1PRED 90, CAT 5.
    pub fn mild_patient() -> Map<String, Value> {
        object(json!({
            "AGE": 70, "PackHistory": 40, "MWT1Best": 500, "FEV1": 3.5, "FEV1PRED": 90,
            "FVC": 2.5, "FVCPRED": 80, "CAT": 5, "HAD": 10, "SGRQ": 50, "AGEquartiles": 3,
            "gender": 1, "smoking": 2, "Diabetes": 0, "muscular": 0, "hypertension": 1,
            "AtrialFib": 0, "IHD": 0
        }))
    }

    /// FEV1PRED 30, CAT 30.
    pub fn very_severe_patient() -> Map<String, Value> {
        object(json!({
            "AGE": 65, "PackHistory": 60, "MWT1Best": 200, "FEV1": 0.9, "FEV1PRED": 30,
            "FVC": 2.0, "FVCPRED": 70, "CAT": 30, "HAD": 18, "SGRQ": 70, "AGEquartiles": 2,
            "gender": 0, "smoking": 1, "Diabetes": 1, "muscular": 0, "hypertension": 0,
            "AtrialFib": 0, "IHD": 1
        }))
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("fixture is an object"),
        }
    }
}
