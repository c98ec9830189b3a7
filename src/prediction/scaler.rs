//! Standardization fitted at training time: `(x - mean) / scale`.

use serde::{Deserialize, Serialize};

use super::artifacts::ArtifactError;
use super::features::FEATURE_NAMES;
use super::PredictionError;

/// Fitted parameters of a standard scaler, one entry per feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Column names seen during fit. Older exports omit them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl StandardScaler {
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Reject parameter sets that would produce NaN/inf or silently reorder columns.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.mean.len() != self.scale.len() {
            return Err(invalid(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(invalid(format!("mean[{i}] is not finite")));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(invalid(format!("scale[{i}] must be finite and non-zero")));
        }
        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
                return Err(invalid(format!(
                    "feature_names {names:?} do not match the expected column order"
                )));
            }
        }
        Ok(())
    }

    /// Standardize one row.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.width() {
            return Err(PredictionError::FeatureCount {
                expected: self.width(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}

fn invalid(reason: String) -> ArtifactError {
    ArtifactError::Invalid {
        artifact: "scaler",
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler {
            mean: vec![10.0, 0.0, -2.0],
            scale: vec![2.0, 1.0, 0.5],
            feature_names: None,
        }
    }

    #[test]
    fn transform_standardizes_each_column() {
        let out = scaler().transform(&[14.0, 3.0, -1.0]).unwrap();
        assert_eq!(out, vec![2.0, 3.0, 2.0]);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        match scaler().transform(&[1.0, 2.0]) {
            Err(PredictionError::FeatureCount { expected, actual }) => {
                assert_eq!((expected, actual), (3, 2));
            }
            other => panic!("expected FeatureCount, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_zero_scale() {
        let mut s = scaler();
        s.scale[1] = 0.0;
        assert!(matches!(s.validate(), Err(ArtifactError::Invalid { .. })));
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let mut s = scaler();
        s.mean.push(1.0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_checks_feature_name_order() {
        let mut names: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        let ok = StandardScaler {
            mean: vec![0.0; 18],
            scale: vec![1.0; 18],
            feature_names: Some(names.clone()),
        };
        assert!(ok.validate().is_ok());

        names.swap(0, 1);
        let swapped = StandardScaler {
            feature_names: Some(names),
            ..ok
        };
        assert!(swapped.validate().is_err());
    }
}
