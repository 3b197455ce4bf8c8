use async_trait::async_trait;

use crate::models::Registry;
use super::errors::RepositoryError;

/// Whole-document access to the patient registry.
///
/// Every operation reads or replaces the complete registry; there is no
/// partial access and no locking between a `load` and the following `save`.
#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Read the entire registry
    async fn load(&self) -> Result<Registry, RepositoryError>;

    /// Replace the entire registry
    async fn save(&self, registry: &Registry) -> Result<(), RepositoryError>;
}
