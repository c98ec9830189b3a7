use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields a client must send to register a patient.
pub const REQUIRED_PATIENT_FIELDS: [&str; 3] = ["name", "age", "gender"];

/// Upper bound on a plausible age in years.
const MAX_AGE: u32 = 130;

/// Patient owned by one clinician. Only the owner can list or view it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Sequential, assigned by the store.
    pub id: String,
    /// Owning username.
    pub username: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub created_at: DateTime<Utc>,
    pub last_visit: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub gender: String,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Patient name is required".into());
        }
        if self.gender.trim().is_empty() {
            return Err("Patient gender is required".into());
        }
        if self.age > MAX_AGE {
            return Err(format!("Age must be between 0 and {MAX_AGE}"));
        }
        Ok(())
    }
}
