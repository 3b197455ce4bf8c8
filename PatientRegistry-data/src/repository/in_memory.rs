use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::models::Registry;
use super::errors::RepositoryError;
use super::patient::PatientStore;

/// In-memory registry store.
///
/// Clones share the same registry, so a test can keep a handle and inspect
/// what the service persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    registry: Arc<Mutex<Registry>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given registry
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }

    /// Copy of the currently stored registry
    pub fn snapshot(&self) -> Result<Registry, RepositoryError> {
        Ok(self.registry.lock()?.clone())
    }
}

#[async_trait]
impl PatientStore for InMemoryStore {
    async fn load(&self) -> Result<Registry, RepositoryError> {
        self.snapshot()
    }

    async fn save(&self, registry: &Registry) -> Result<(), RepositoryError> {
        let mut store = self.registry.lock()?;
        *store = registry.clone();
        Ok(())
    }
}
