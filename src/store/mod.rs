//! Persistence for users, patients and predictions.
//!
//! Handlers talk to the `Repository` trait; `JsonFileStore` is the
//! flat-file implementation used in production and tests.

pub mod json_file;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{NewPatient, Patient, Prediction, User};

pub use json_file::JsonFileStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted data file {}: {source}", file.display())]
    Corrupt {
        file: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(serde_json::Error),

    #[error("Atomic replace failed: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Storage operations needed by the HTTP layer.
///
/// Every patient and prediction query is scoped to an owning username.
pub trait Repository: Send + Sync {
    fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `UsernameTaken` without touching the existing record.
    fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Assign the next sequential id and persist.
    fn add_patient(&self, owner: &str, patient: NewPatient) -> Result<Patient, StoreError>;

    fn list_patients_for_user(&self, username: &str) -> Result<Vec<Patient>, StoreError>;

    fn find_patient(&self, id: &str, username: &str) -> Result<Option<Patient>, StoreError>;

    /// Stamp `last_visit` on an owned patient.
    fn record_visit(&self, id: &str, username: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    fn append_prediction(&self, prediction: &Prediction) -> Result<(), StoreError>;

    /// Oldest first.
    fn list_predictions_for_user(&self, username: &str) -> Result<Vec<Prediction>, StoreError>;

    fn list_predictions_for_patient(
        &self,
        patient_id: &str,
        username: &str,
    ) -> Result<Vec<Prediction>, StoreError>;
}
