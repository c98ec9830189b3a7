//! Patient endpoints.
//!
//! - `POST /add-patient` — register a patient for the current user
//! - `GET /patient/:id/predictions` — one owned patient and its history

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{json_object, ApiContext, CurrentUser};
use crate::models::patient::REQUIRED_PATIENT_FIELDS;
use crate::models::{missing_fields, NewPatient, Patient, Prediction};

#[derive(Serialize)]
pub struct AddPatientResponse {
    pub success: bool,
    pub patient: Patient,
}

/// `POST /add-patient`
pub async fn add(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<AddPatientResponse>, ApiError> {
    let object = json_object(payload)?;

    let missing = missing_fields(&object, &REQUIRED_PATIENT_FIELDS);
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let new_patient: NewPatient = serde_json::from_value(Value::Object(object))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    new_patient.validate().map_err(ApiError::BadRequest)?;

    let patient = ctx.core.repository().add_patient(&user.username, new_patient)?;

    Ok(Json(AddPatientResponse {
        success: true,
        patient,
    }))
}

#[derive(Serialize)]
pub struct PatientPredictionsResponse {
    pub patient: Patient,
    pub predictions: Vec<Prediction>,
}

/// `GET /patient/:id/predictions`
///
/// Another user's patient is indistinguishable from a missing one.
pub async fn predictions(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<CurrentUser>,
    Path(patient_id): Path<String>,
) -> Result<Json<PatientPredictionsResponse>, ApiError> {
    let repo = ctx.core.repository();

    let patient = repo
        .find_patient(&patient_id, &user.username)?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;
    let predictions = repo.list_predictions_for_patient(&patient.id, &user.username)?;

    Ok(Json(PatientPredictionsResponse {
        patient,
        predictions,
    }))
}
