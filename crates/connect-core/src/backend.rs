use crate::{
    BackendError, ConnectDefinition, ConnectDefinitionRef, ConnectTaskRef, ConnectWorkerRef,
};
use async_trait::async_trait;

/// Administration backend for the Connect worker groups of one cluster.
///
/// Implementations talk to the real management API (or fake it). They report
/// failures as [`BackendError`] and must never turn a failure into an empty
/// result.
#[async_trait]
pub trait ConnectBackend: Send + Sync {
    /// Names of the connectors hosted by a worker group
    async fn list_connector_names(
        &self,
        worker: &ConnectWorkerRef,
    ) -> Result<Vec<String>, BackendError>;

    /// Fetch configuration, status and tasks of one connector
    async fn get_connector(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> Result<ConnectDefinition, BackendError>;

    /// Fetch every connector of a worker group.
    /// Fails as a whole if any single connector cannot be fetched.
    async fn list_connectors(
        &self,
        worker: &ConnectWorkerRef,
    ) -> Result<Vec<ConnectDefinition>, BackendError>;

    async fn pause(&self, definition: &ConnectDefinitionRef) -> Result<(), BackendError>;

    async fn resume(&self, definition: &ConnectDefinitionRef) -> Result<(), BackendError>;

    /// Restart the connector and its failed tasks
    async fn restart(&self, definition: &ConnectDefinitionRef) -> Result<(), BackendError>;

    async fn restart_task(&self, task: &ConnectTaskRef) -> Result<(), BackendError>;

    async fn delete_connector(&self, definition: &ConnectDefinitionRef)
        -> Result<(), BackendError>;
}
