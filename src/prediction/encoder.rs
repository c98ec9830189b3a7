//! Label encoder: class index ↔ severity label.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::artifacts::ArtifactError;

/// Sorted class labels, as produced by fitting a label encoder on the
/// severity column (`MILD`, `MODERATE`, `SEVERE`, `VERY SEVERE`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.classes.is_empty() {
            return Err(invalid("no classes".into()));
        }
        if let Some(blank) = self.classes.iter().position(|c| c.trim().is_empty()) {
            return Err(invalid(format!("class {blank} has an empty label")));
        }
        let mut seen = HashSet::new();
        for label in &self.classes {
            if !seen.insert(label.as_str()) {
                return Err(invalid(format!("duplicate class label {label:?}")));
            }
        }
        Ok(())
    }

    /// Map a class index back to its label.
    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}

fn invalid(reason: String) -> ArtifactError {
    ArtifactError::Invalid {
        artifact: "label encoder",
        reason,
    }
}
