//! `GET /dashboard` — the clinician's landing data.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CurrentUser};
use crate::models::{Patient, Prediction};

/// How many of the user's latest predictions the dashboard shows.
pub const RECENT_PREDICTIONS: usize = 5;

#[derive(Serialize)]
pub struct DashboardResponse {
    pub username: String,
    /// Oldest first, at most `RECENT_PREDICTIONS`.
    pub recent_predictions: Vec<Prediction>,
    pub patients: Vec<Patient>,
}

pub async fn show(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let repo = ctx.core.repository();

    let mut predictions = repo.list_predictions_for_user(&user.username)?;
    let skip = predictions.len().saturating_sub(RECENT_PREDICTIONS);
    let recent_predictions = predictions.split_off(skip);

    let patients = repo.list_patients_for_user(&user.username)?;

    Ok(Json(DashboardResponse {
        username: user.username,
        recent_predictions,
        patients,
    }))
}
