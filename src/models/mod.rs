pub mod patient;
pub mod prediction;
pub mod user;

pub use patient::{NewPatient, Patient};
pub use prediction::Prediction;
pub use user::User;

use serde_json::{Map, Value};

/// Names from `required` that are absent from `object`, in `required` order.
pub fn missing_fields(object: &Map<String, Value>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|name| !object.contains_key(*name))
        .collect()
}
