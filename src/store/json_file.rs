//! Flat JSON-file repository.
//!
//! Three documents live in the data directory:
//! - `users.json`       — object: username → `{password_hash, created_at}`
//! - `patients.json`    — array of patients
//! - `predictions.json` — array of predictions
//!
//! Every mutation is a whole-file read-modify-write. Mutations are
//! serialized by one mutex, and each write goes to a temp file in the
//! same directory that is then renamed over the target, so a reader
//! always sees a complete document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{Repository, StoreError};
use crate::models::{NewPatient, Patient, Prediction, User};

pub const USERS_FILE: &str = "users.json";
pub const PATIENTS_FILE: &str = "patients.json";
pub const PREDICTIONS_FILE: &str = "predictions.json";

/// On-disk shape of a user entry (the username is the map key).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    password_hash: String,
    created_at: DateTime<Utc>,
}

type Users = BTreeMap<String, StoredUser>;

pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory and any
    /// missing documents.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let store = Self {
            dir: dir.to_path_buf(),
            write_lock: Mutex::new(()),
        };

        if !store.path(USERS_FILE).exists() {
            store.write(USERS_FILE, &Users::new())?;
        }
        if !store.path(PATIENTS_FILE).exists() {
            store.write(PATIENTS_FILE, &Vec::<Patient>::new())?;
        }
        if !store.path(PREDICTIONS_FILE).exists() {
            store.write(PREDICTIONS_FILE, &Vec::<Prediction>::new())?;
        }

        tracing::info!(dir = %dir.display(), "JSON store opened");
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, StoreError> {
        let path = self.path(file);
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt { file: path, source })
    }

    fn write<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, value).map_err(StoreError::Serialize)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path(file))?;
        Ok(())
    }

    /// Read-modify-write one document under the writer lock. The document
    /// is written back only when `mutate` succeeds.
    fn update<T, R>(
        &self,
        file: &str,
        mutate: impl FnOnce(&mut T) -> Result<R, StoreError>,
    ) -> Result<R, StoreError>
    where
        T: DeserializeOwned + Serialize,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut document: T = self.read(file)?;
        let result = mutate(&mut document)?;
        self.write(file, &document)?;
        Ok(result)
    }
}

impl Repository for JsonFileStore {
    fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users: Users = self.read(USERS_FILE)?;
        Ok(users.get(username).map(|stored| User {
            username: username.to_string(),
            password_hash: stored.password_hash.clone(),
            created_at: stored.created_at,
        }))
    }

    fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.update(USERS_FILE, |users: &mut Users| {
            if users.contains_key(&user.username) {
                return Err(StoreError::UsernameTaken(user.username.clone()));
            }
            users.insert(
                user.username.clone(),
                StoredUser {
                    password_hash: user.password_hash.clone(),
                    created_at: user.created_at,
                },
            );
            Ok(())
        })?;
        tracing::info!(username = %user.username, "User registered");
        Ok(())
    }

    fn add_patient(&self, owner: &str, patient: NewPatient) -> Result<Patient, StoreError> {
        let created = self.update(PATIENTS_FILE, |patients: &mut Vec<Patient>| {
            let created = Patient {
                id: (patients.len() + 1).to_string(),
                username: owner.to_string(),
                name: patient.name,
                age: patient.age,
                gender: patient.gender,
                created_at: Utc::now(),
                last_visit: None,
            };
            patients.push(created.clone());
            Ok(created)
        })?;
        tracing::info!(patient_id = %created.id, owner, "Patient added");
        Ok(created)
    }

    fn list_patients_for_user(&self, username: &str) -> Result<Vec<Patient>, StoreError> {
        let patients: Vec<Patient> = self.read(PATIENTS_FILE)?;
        Ok(patients.into_iter().filter(|p| p.username == username).collect())
    }

    fn find_patient(&self, id: &str, username: &str) -> Result<Option<Patient>, StoreError> {
        let patients: Vec<Patient> = self.read(PATIENTS_FILE)?;
        Ok(patients
            .into_iter()
            .find(|p| p.id == id && p.username == username))
    }

    fn record_visit(&self, id: &str, username: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update(PATIENTS_FILE, |patients: &mut Vec<Patient>| {
            let patient = patients
                .iter_mut()
                .find(|p| p.id == id && p.username == username)
                .ok_or_else(|| StoreError::PatientNotFound(id.to_string()))?;
            patient.last_visit = Some(at);
            Ok(())
        })
    }

    fn append_prediction(&self, prediction: &Prediction) -> Result<(), StoreError> {
        self.update(PREDICTIONS_FILE, |predictions: &mut Vec<Prediction>| {
            predictions.push(prediction.clone());
            Ok(())
        })?;
        tracing::debug!(prediction_id = %prediction.id, severity = %prediction.severity, "Prediction stored");
        Ok(())
    }

    fn list_predictions_for_user(&self, username: &str) -> Result<Vec<Prediction>, StoreError> {
        let predictions: Vec<Prediction> = self.read(PREDICTIONS_FILE)?;
        Ok(predictions
            .into_iter()
            .filter(|p| p.username == username)
            .collect())
    }

    fn list_predictions_for_patient(
        &self,
        patient_id: &str,
        username: &str,
    ) -> Result<Vec<Prediction>, StoreError> {
        let predictions: Vec<Prediction> = self.read(PREDICTIONS_FILE)?;
        Ok(predictions
            .into_iter()
            .filter(|p| p.username == username && p.patient_id.as_deref() == Some(patient_id))
            .collect())
    }
}
