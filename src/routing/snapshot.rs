//! Immutable routing configuration snapshots.
//!
//! Readers take one [`Arc<RoutingTable>`] per request and keep it for the
//! whole decision; reloads build a new table and swap it in atomically.

use super::{ModelCandidate, Provider, RoutingError};
use crate::classifier::{ContinuationDetector, RoutingMode, FALLBACK_CATEGORY};
use crate::config::{default_categories, CategoryConfig, DEFAULT_MODEL};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Everything a routing decision reads from configuration.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    pub mode: RoutingMode,
    /// Used when neither the category nor `conversation` is configured
    pub default_model: ModelCandidate,
    pub categories: BTreeMap<String, CategoryConfig>,
    pub continuation: ContinuationDetector,
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self {
            mode: RoutingMode::default(),
            default_model: ModelCandidate::new(Provider::default(), DEFAULT_MODEL),
            categories: default_categories(),
            continuation: ContinuationDetector::default(),
        }
    }
}

impl RoutingTable {
    /// Ordered candidates for `category`.
    ///
    /// Unknown categories use the `conversation` list, and the default model
    /// stands in when that is missing too. An empty list is a configuration
    /// error.
    pub fn candidates_for(&self, category: &str) -> Result<Vec<ModelCandidate>, RoutingError> {
        let models = match self
            .categories
            .get(category)
            .or_else(|| self.categories.get(FALLBACK_CATEGORY))
        {
            Some(config) => config.models.clone(),
            None => vec![self.default_model.clone()],
        };

        if models.is_empty() {
            return Err(RoutingError::Configuration(format!(
                "category '{}' has no models configured",
                category
            )));
        }
        Ok(models)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }
}

/// Holder of the current [`RoutingTable`].
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<RoutingTable>>,
}

impl ConfigStore {
    pub fn new(table: RoutingTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// The table in effect right now.
    pub fn snapshot(&self) -> Arc<RoutingTable> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Replace the table, returning the previous one.
    pub fn publish(&self, table: RoutingTable) -> Arc<RoutingTable> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(table))
    }

    /// Derive a new table from the current one and publish it.
    ///
    /// Concurrent updates are serialized, so none is lost. Nothing is
    /// published when `f` fails.
    pub fn update<F, E>(&self, f: F) -> Result<Arc<RoutingTable>, E>
    where
        F: FnOnce(&RoutingTable) -> Result<RoutingTable, E>,
    {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = Arc::new(f(&guard)?);
        *guard = Arc::clone(&next);
        Ok(next)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(RoutingTable::default())
    }
}
