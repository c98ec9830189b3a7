//! Process-wide application state.
//!
//! `CoreState` is built once at startup and shared behind an `Arc` by every
//! request handler. It owns nothing mutable itself: the repository
//! serializes its own writes and the prediction service is read-only.

use std::sync::Arc;

use crate::config::Settings;
use crate::prediction::{ArtifactError, PredictionService};
use crate::store::{JsonFileStore, Repository, StoreError};

/// Failures that abort startup before the server binds.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Model artifacts unusable: {0}")]
    Artifacts(#[from] ArtifactError),

    #[error("Data store unusable: {0}")]
    Store(#[from] StoreError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub settings: Settings,
    repository: Arc<dyn Repository>,
    predictor: Arc<PredictionService>,
}

impl CoreState {
    pub fn new(
        settings: Settings,
        repository: Arc<dyn Repository>,
        predictor: Arc<PredictionService>,
    ) -> Self {
        Self {
            settings,
            repository,
            predictor,
        }
    }

    /// Open the JSON store and load the model artifacts named by `settings`.
    pub fn initialize(settings: Settings) -> Result<Self, StartupError> {
        let store = JsonFileStore::open(&settings.storage.data_dir)?;
        let predictor = PredictionService::load(&settings.model.artifact_paths())?;
        Ok(Self::new(settings, Arc::new(store), Arc::new(predictor)))
    }

    pub fn repository(&self) -> &dyn Repository {
        self.repository.as_ref()
    }

    pub fn predictor(&self) -> &PredictionService {
        &self.predictor
    }
}
