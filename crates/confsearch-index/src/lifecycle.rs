use std::sync::Arc;

use confsearch_core::traits::SearchBackend;
use confsearch_core::{Error, Result};
use serde_json::Value;
use tracing::info;

/// Keeps one named index in a known state: ABSENT or PRESENT.
///
/// Both transitions are guarded by an existence check, so repeating either
/// operation is harmless. A transition only counts once the backend
/// acknowledges it; an unacknowledged create or delete is a configuration
/// error and is never retried here.
#[derive(Clone)]
pub struct IndexLifecycleManager {
    backend: Arc<dyn SearchBackend>,
    index: String,
}

impl IndexLifecycleManager {
    pub fn new(backend: Arc<dyn SearchBackend>, index: impl Into<String>) -> Self {
        Self { backend, index: index.into() }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub async fn exists(&self) -> Result<bool> {
        self.backend.exists(&self.index).await
    }

    /// Returns `true` if this call created the index.
    pub async fn create_if_needed(&self, config: &Value) -> Result<bool> {
        if self.exists().await? {
            info!("Index '{}' already exists", self.index);
            return Ok(false);
        }
        if !self.backend.create(&self.index, config).await? {
            return Err(Error::Configuration(format!(
                "Creation of index '{}' was not acknowledged",
                self.index
            )));
        }
        info!("Created index '{}'", self.index);
        Ok(true)
    }

    /// Returns `true` if this call deleted the index.
    pub async fn delete_data(&self) -> Result<bool> {
        if !self.exists().await? {
            info!("Index '{}' does not exist, nothing to delete", self.index);
            return Ok(false);
        }
        if !self.backend.delete(&self.index).await? {
            return Err(Error::Configuration(format!(
                "Deletion of index '{}' was not acknowledged",
                self.index
            )));
        }
        info!("Deleted index '{}'", self.index);
        Ok(true)
    }
}
