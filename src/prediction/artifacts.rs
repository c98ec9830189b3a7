//! Loading the three offline-trained artifacts from disk.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::encoder::LabelEncoder;
use super::forest::RandomForest;
use super::scaler::StandardScaler;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Cannot read {artifact} artifact at {}: {source}", path.display())]
    Io {
        artifact: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed {artifact} artifact at {}: {source}", path.display())]
    Parse {
        artifact: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid {artifact} artifact: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },
}

/// Locations of the classifier, scaler and label encoder files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub scaler: PathBuf,
    pub label_encoder: PathBuf,
}

impl ArtifactPaths {
    /// Resolve the three file names against a model directory.
    pub fn in_dir(dir: &Path, classifier: &str, scaler: &str, label_encoder: &str) -> Self {
        Self {
            classifier: dir.join(classifier),
            scaler: dir.join(scaler),
            label_encoder: dir.join(label_encoder),
        }
    }
}

pub fn load_scaler(path: &Path) -> Result<StandardScaler, ArtifactError> {
    let scaler: StandardScaler = read_json("scaler", path)?;
    scaler.validate()?;
    Ok(scaler)
}

pub fn load_label_encoder(path: &Path) -> Result<LabelEncoder, ArtifactError> {
    let encoder: LabelEncoder = read_json("label encoder", path)?;
    encoder.validate()?;
    Ok(encoder)
}

pub fn load_forest(path: &Path) -> Result<RandomForest, ArtifactError> {
    let forest: RandomForest = read_json("classifier", path)?;
    forest.validate()?;
    Ok(forest)
}

fn read_json<T: DeserializeOwned>(artifact: &'static str, path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        artifact,
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        artifact,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::fixtures;

    #[test]
    fn loads_written_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let paths = fixtures::write_artifacts(dir.path());

        assert_eq!(load_scaler(&paths.scaler).unwrap(), fixtures::scaler());
        assert_eq!(load_label_encoder(&paths.label_encoder).unwrap(), fixtures::encoder());
        assert_eq!(load_forest(&paths.classifier).unwrap(), fixtures::forest());
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_scaler(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { artifact: "scaler", .. }));
    }

    #[test]
    fn garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label_encoder.json");
        std::fs::write(&path, b"\x80\x04\x95 pickle bytes").unwrap();
        let err = load_label_encoder(&path).unwrap_err();
        // Non-UTF-8 content fails at read time, anything else at parse time.
        assert!(matches!(err, ArtifactError::Io { .. } | ArtifactError::Parse { .. }));

        std::fs::write(&path, r#"{"classes": "MILD"}"#).unwrap();
        assert!(matches!(
            load_label_encoder(&path).unwrap_err(),
            ArtifactError::Parse { .. }
        ));
    }

    #[test]
    fn structurally_invalid_forest_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = fixtures::write_artifacts(dir.path());
        let mut forest = fixtures::forest();
        forest.trees[0].children_left[0] = 0;
        std::fs::write(&paths.classifier, serde_json::to_string(&forest).unwrap()).unwrap();

        assert!(matches!(
            load_forest(&paths.classifier).unwrap_err(),
            ArtifactError::Invalid { artifact: "classifier", .. }
        ));
    }

    #[test]
    fn in_dir_joins_names() {
        let paths = ArtifactPaths::in_dir(Path::new("/models"), "rf.json", "s.json", "le.json");
        assert_eq!(paths.classifier, Path::new("/models/rf.json"));
        assert_eq!(paths.scaler, Path::new("/models/s.json"));
        assert_eq!(paths.label_encoder, Path::new("/models/le.json"));
    }
}
