//! Fixed-schema clinical feature record.
//!
//! The scaler and classifier were fit on columns in `FEATURE_NAMES` order,
//! so every record is flattened in exactly that order before inference.
//! Incoming JSON may list the keys in any order and may carry extra keys
//! (e.g. `patient_id`), which are ignored here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::PredictionError;
use crate::models::missing_fields;

/// Number of model input features.
pub const FEATURE_COUNT: usize = 18;

/// Canonical feature order used at training time.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "AGE",
    "PackHistory",
    "MWT1Best",
    "FEV1",
    "FEV1PRED",
    "FVC",
    "FVCPRED",
    "CAT",
    "HAD",
    "SGRQ",
    "AGEquartiles",
    "gender",
    "smoking",
    "Diabetes",
    "muscular",
    "hypertension",
    "AtrialFib",
    "IHD",
];

/// One patient's measurements, as submitted to `/predict`.
///
/// Categorical fields (`gender`, `smoking`, comorbidity flags, `AGEquartiles`)
/// carry the numeric codes assigned at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "AGE")]
    pub age: f64,
    #[serde(rename = "PackHistory")]
    pub pack_history: f64,
    #[serde(rename = "MWT1Best")]
    pub mwt1_best: f64,
    #[serde(rename = "FEV1")]
    pub fev1: f64,
    #[serde(rename = "FEV1PRED")]
    pub fev1_pred: f64,
    #[serde(rename = "FVC")]
    pub fvc: f64,
    #[serde(rename = "FVCPRED")]
    pub fvc_pred: f64,
    #[serde(rename = "CAT")]
    pub cat: f64,
    #[serde(rename = "HAD")]
    pub had: f64,
    #[serde(rename = "SGRQ")]
    pub sgrq: f64,
    #[serde(rename = "AGEquartiles")]
    pub age_quartiles: f64,
    pub gender: f64,
    pub smoking: f64,
    #[serde(rename = "Diabetes")]
    pub diabetes: f64,
    pub muscular: f64,
    pub hypertension: f64,
    #[serde(rename = "AtrialFib")]
    pub atrial_fib: f64,
    #[serde(rename = "IHD")]
    pub ihd: f64,
}

impl FeatureRecord {
    /// Build a record from a loosely-typed JSON object.
    ///
    /// Absent fields are reported together, in canonical order. A field that
    /// is present but not a JSON number is reported on its own.
    pub fn from_json_object(object: &Map<String, Value>) -> Result<Self, PredictionError> {
        let missing = missing_fields(object, &FEATURE_NAMES);
        if !missing.is_empty() {
            return Err(PredictionError::MissingFields(missing));
        }

        let mut row = [0.0_f64; FEATURE_COUNT];
        for (slot, name) in row.iter_mut().zip(FEATURE_NAMES) {
            *slot = match object.get(name) {
                Some(Value::Number(n)) => n.as_f64().ok_or_else(|| PredictionError::InvalidFeature {
                    field: name,
                    reason: format!("{n} is not representable as a float"),
                })?,
                other => {
                    return Err(PredictionError::InvalidFeature {
                        field: name,
                        reason: format!(
                            "expected a number, got {}",
                            other.map_or("nothing", json_kind)
                        ),
                    })
                }
            };
        }
        Ok(Self::from_row(row))
    }

    /// Assemble a record from a row in canonical order.
    pub fn from_row(row: [f64; FEATURE_COUNT]) -> Self {
        Self {
            age: row[0],
            pack_history: row[1],
            mwt1_best: row[2],
            fev1: row[3],
            fev1_pred: row[4],
            fvc: row[5],
            fvc_pred: row[6],
            cat: row[7],
            had: row[8],
            sgrq: row[9],
            age_quartiles: row[10],
            gender: row[11],
            smoking: row[12],
            diabetes: row[13],
            muscular: row[14],
            hypertension: row[15],
            atrial_fib: row[16],
            ihd: row[17],
        }
    }

    /// Flatten to the canonical column order.
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.pack_history,
            self.mwt1_best,
            self.fev1,
            self.fev1_pred,
            self.fvc,
            self.fvc_pred,
            self.cat,
            self.had,
            self.sgrq,
            self.age_quartiles,
            self.gender,
            self.smoking,
            self.diabetes,
            self.muscular,
            self.hypertension,
            self.atrial_fib,
            self.ihd,
        ]
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
