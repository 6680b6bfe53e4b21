//! Pose and scene persistence
//!
//! Documents are addressed by name through `DocumentStore`. Scenes refer to
//! poses by name only, so a pose is looked up again every time a step plays.

pub mod documents;
pub mod file;
pub mod legacy;
pub mod memory;

use std::collections::BTreeMap;

use crate::joints::JointVector;
use crate::motion::{PoseResolver, ResolveError};

pub use documents::{
    timestamp_now, Pose, PoseDocument, SceneDocument, StepDocument, TIMESTAMP_FORMAT,
};
pub use file::JsonFileStore;
pub use legacy::import_yaml;
pub use memory::MemoryStore;

/// Errors from document stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid document name '{0}'")]
    InvalidName(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A name-keyed collection of documents
pub trait DocumentStore<D>: Send + Sync {
    /// Every stored document, ordered by name
    fn load_all(&self) -> StoreResult<BTreeMap<String, D>>;

    /// Insert or overwrite `name`
    fn save(&self, name: &str, doc: D) -> StoreResult<()>;

    /// Remove `name`. Returns whether it existed.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Look up `name`; surrounding whitespace is ignored as it is on save
    fn load(&self, name: &str) -> StoreResult<Option<D>> {
        Ok(self.load_all()?.remove(name.trim()))
    }

    fn names(&self) -> StoreResult<Vec<String>> {
        Ok(self.load_all()?.into_keys().collect())
    }
}

pub type PoseStore = dyn DocumentStore<PoseDocument>;
pub type SceneStore = dyn DocumentStore<SceneDocument>;

/// Names are trimmed and must not be empty
pub fn check_name(name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(trimmed)
    }
}

/// Resolves scene pose names against a pose store
pub struct StoredPoses<'a>(pub &'a PoseStore);

impl PoseResolver for StoredPoses<'_> {
    fn resolve(&self, name: &str) -> Result<JointVector, ResolveError> {
        match self.0.load(name) {
            Ok(Some(doc)) => doc.angles().map_err(|e| ResolveError::Unreadable(e.to_string())),
            Ok(None) => Err(ResolveError::Missing),
            Err(e) => Err(ResolveError::Unreadable(e.to_string())),
        }
    }
}
