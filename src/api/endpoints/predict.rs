//! `POST /predict` — classify one set of measurements and record it.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{Extension, Json};
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::api::types::{json_object, ApiContext, CurrentUser};
use crate::models::Prediction;
use crate::prediction::{FeatureRecord, SeverityPrediction};

pub const PATIENT_ID_FIELD: &str = "patient_id";

pub async fn submit(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SeverityPrediction>, ApiError> {
    let object = json_object(payload)?;
    let record = FeatureRecord::from_json_object(&object)?;
    let patient_id = patient_id(&object)?;

    let repo = ctx.core.repository();
    if let Some(id) = &patient_id {
        if repo.find_patient(id, &user.username)?.is_none() {
            return Err(ApiError::NotFound("Patient not found".into()));
        }
    }

    let outcome = ctx.core.predictor().predict(&record)?;

    let prediction = Prediction::new(&user.username, outcome.clone(), record, patient_id);
    repo.append_prediction(&prediction)?;
    // The prediction is already stored; a stale last_visit is not worth a 500.
    if let Some(id) = &prediction.patient_id {
        if let Err(e) = repo.record_visit(id, &user.username, prediction.timestamp) {
            tracing::warn!(patient_id = %id, error = %e, "Failed to stamp last visit");
        }
    }

    tracing::info!(
        username = %user.username,
        severity = %outcome.severity,
        patient_id = prediction.patient_id.as_deref().unwrap_or("-"),
        "Prediction recorded"
    );

    Ok(Json(outcome))
}

/// Optional link to a patient. Clients send the id either as the string
/// the store assigned or as a bare number.
fn patient_id(object: &Map<String, Value>) -> Result<Option<String>, ApiError> {
    match object.get(PATIENT_ID_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) if n.is_u64() => Ok(Some(n.to_string())),
        Some(_) => Err(ApiError::BadRequest(
            "patient_id must be a string or a positive integer".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use serde_json::json;

    use super::*;
    use crate::config::Settings;
    use crate::core_state::CoreState;
    use crate::models::{NewPatient, Patient, User};
    use crate::prediction::{fixtures, PredictionService};
    use crate::store::{JsonFileStore, Repository, StoreError};

    /// Delegates to a real store but cannot stamp visits.
    struct VisitFails(JsonFileStore);

    impl Repository for VisitFails {
        fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
            self.0.find_user(username)
        }
        fn insert_user(&self, user: &User) -> Result<(), StoreError> {
            self.0.insert_user(user)
        }
        fn add_patient(&self, owner: &str, patient: NewPatient) -> Result<Patient, StoreError> {
            self.0.add_patient(owner, patient)
        }
        fn list_patients_for_user(&self, username: &str) -> Result<Vec<Patient>, StoreError> {
            self.0.list_patients_for_user(username)
        }
        fn find_patient(&self, id: &str, username: &str) -> Result<Option<Patient>, StoreError> {
            self.0.find_patient(id, username)
        }
        fn record_visit(&self, _: &str, _: &str, _: DateTime<Utc>) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
        fn append_prediction(&self, prediction: &Prediction) -> Result<(), StoreError> {
            self.0.append_prediction(prediction)
        }
        fn list_predictions_for_user(&self, username: &str) -> Result<Vec<Prediction>, StoreError> {
            self.0.list_predictions_for_user(username)
        }
        fn list_predictions_for_patient(
            &self,
            patient_id: &str,
            username: &str,
        ) -> Result<Vec<Prediction>, StoreError> {
            self.0.list_predictions_for_patient(patient_id, username)
        }
    }

    #[tokio::test]
    async fn failed_visit_stamp_still_returns_the_stored_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::for_tests(dir.path());
        std::fs::create_dir_all(&settings.model.dir).unwrap();
        fixtures::write_artifacts(&settings.model.dir);

        let store = JsonFileStore::open(&settings.storage.data_dir).unwrap();
        let predictor = PredictionService::load(&settings.model.artifact_paths()).unwrap();
        let repo = Arc::new(VisitFails(store));
        let core = CoreState::new(settings, repo.clone(), Arc::new(predictor));
        let ctx = ApiContext::new(Arc::new(core));

        let patient = repo
            .add_patient(
                "alice",
                NewPatient {
                    name: "Ada".into(),
                    age: 67,
                    gender: "female".into(),
                },
            )
            .unwrap();

        let mut body = fixtures::mild_patient();
        body.insert(PATIENT_ID_FIELD.into(), json!(patient.id));
        let user = CurrentUser {
            username: "alice".into(),
        };

        let Json(outcome) = submit(State(ctx), Extension(user), Ok(Json(Value::Object(body))))
            .await
            .unwrap();
        assert_eq!(outcome.severity, "MILD");

        let stored = repo.list_predictions_for_patient(&patient.id, "alice").unwrap();
        assert_eq!(stored.len(), 1);
        assert!(repo.find_patient(&patient.id, "alice").unwrap().unwrap().last_visit.is_none());
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn patient_id_accepts_string_and_number() {
        assert_eq!(patient_id(&object(json!({"patient_id": "3"}))).unwrap(), Some("3".into()));
        assert_eq!(patient_id(&object(json!({"patient_id": 3}))).unwrap(), Some("3".into()));
    }

    #[test]
    fn patient_id_absent_null_or_blank_is_none() {
        assert_eq!(patient_id(&object(json!({}))).unwrap(), None);
        assert_eq!(patient_id(&object(json!({"patient_id": null}))).unwrap(), None);
        assert_eq!(patient_id(&object(json!({"patient_id": " "}))).unwrap(), None);
    }

    #[test]
    fn patient_id_rejects_other_types() {
        assert!(patient_id(&object(json!({"patient_id": [1]}))).is_err());
        assert!(patient_id(&object(json!({"patient_id": -2}))).is_err());
    }
}
