//! Persistence for circuit state.

use super::CircuitState;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or saving circuit state.
#[derive(Debug, Error)]
pub enum CircuitStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid circuit state file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Storage for the flat `candidate id -> state` table.
///
/// `load` is called once when the breaker is built; `save` after every
/// operation that changed state.
pub trait CircuitStore: Send + Sync {
    fn load(&self) -> Result<HashMap<String, CircuitState>, CircuitStoreError>;
    fn save(&self, table: &HashMap<String, CircuitState>) -> Result<(), CircuitStoreError>;
}

/// Stores circuit state as a pretty-printed JSON object in a single file.
///
/// Writes go to a sibling temp file first and are renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CircuitStore for JsonFileStore {
    fn load(&self) -> Result<HashMap<String, CircuitState>, CircuitStoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, table: &HashMap<String, CircuitState>) -> Result<(), CircuitStoreError> {
        let ordered: BTreeMap<&String, &CircuitState> = table.iter().collect();
        let body = serde_json::to_vec_pretty(&ordered)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
