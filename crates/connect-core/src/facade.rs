use crate::error::Scope;
use crate::{
    validate_identifier, BackendError, Cluster, ClusterRegistry, ConnectDefinition,
    ConnectDefinitionRef, ConnectError, ConnectTaskRef, ConnectWorkerRef, Result,
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Cluster-agnostic control plane over the Kafka Connect clusters of a registry.
///
/// Every operation resolves its identifiers outer to inner (cluster, connect,
/// definition, task) before touching a backend, then performs exactly one unit
/// of work against the resolved cluster. The facade keeps no connector state of
/// its own and never retries.
pub struct ConnectFacade {
    registry: ClusterRegistry,
}

impl ConnectFacade {
    pub fn new(registry: ClusterRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    /// Resolve a worker group without contacting any backend
    pub fn resolve_worker(&self, cluster_id: &str, connect_id: &str) -> Result<ConnectWorkerRef> {
        Ok(self.worker(cluster_id, connect_id)?.1)
    }

    /// Resolve a definition address without contacting any backend
    pub fn resolve_definition(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<ConnectDefinitionRef> {
        Ok(self.definition(cluster_id, connect_id, definition_id)?.1)
    }

    /// Resolve a task address without contacting any backend
    pub fn resolve_task(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
        task_id: u32,
    ) -> Result<ConnectTaskRef> {
        let (_, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        Ok(definition.task(task_id))
    }

    /// Configured cluster ids, sorted
    pub fn list_clusters(&self) -> Vec<String> {
        self.registry.list_clusters()
    }

    /// Worker group ids of a cluster, in configuration order
    pub fn list_connect_names(&self, cluster_id: &str) -> Result<Vec<String>> {
        debug!("Fetch all connects from cluster {}", cluster_id);
        let cluster = self.registry.resolve_cluster(cluster_id)?;
        Ok(cluster.connect_ids().to_vec())
    }

    /// Names of all connectors known to any worker group of a cluster,
    /// sorted and de-duplicated. A cluster without connectors yields an empty
    /// list.
    pub async fn list_connector_names(&self, cluster_id: &str) -> Result<Vec<String>> {
        let cluster = self.registry.resolve_cluster(cluster_id)?;
        debug!("Fetch connector names from cluster {}", cluster_id);

        let mut names = BTreeSet::new();
        for worker in cluster.workers() {
            let worker_names = cluster
                .backend()
                .list_connector_names(&worker)
                .await
                .map_err(|e| fail(Scope::Worker(&worker), e))?;
            names.extend(worker_names);
        }

        Ok(names.into_iter().collect())
    }

    /// Fetch a fresh snapshot of one connector
    pub async fn get_definition(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<ConnectDefinition> {
        let (cluster, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        debug!("Fetching definition: {}", definition);

        cluster
            .backend()
            .get_connector(&definition)
            .await
            .map_err(|e| fail(Scope::Definition(&definition), e))
    }

    /// Fetch every connector of a worker group, ordered by name.
    ///
    /// If one connector's detail cannot be fetched the whole call fails; a
    /// shorter list is never returned as success.
    pub async fn list_definitions(
        &self,
        cluster_id: &str,
        connect_id: &str,
    ) -> Result<Vec<ConnectDefinition>> {
        let (cluster, worker) = self.worker(cluster_id, connect_id)?;
        debug!("Fetching definitions for connect: {}", worker);

        list_sorted(cluster, &worker).await
    }

    /// Pause a connector. Pausing an already paused connector succeeds.
    pub async fn pause(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<()> {
        let (cluster, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        debug!("Pausing definition {}", definition);

        match cluster.backend().pause(&definition).await {
            Err(BackendError::AlreadyInState) => {
                debug!("Definition {} is already paused", definition);
                Ok(())
            }
            other => other.map_err(|e| fail(Scope::Definition(&definition), e)),
        }
    }

    /// Resume a connector. Resuming a running connector succeeds.
    pub async fn resume(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<()> {
        let (cluster, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        debug!("Resuming definition {}", definition);

        match cluster.backend().resume(&definition).await {
            Err(BackendError::AlreadyInState) => {
                debug!("Definition {} is already running", definition);
                Ok(())
            }
            other => other.map_err(|e| fail(Scope::Definition(&definition), e)),
        }
    }

    /// Restart a connector and its failed tasks.
    ///
    /// Forwarded as-is on every call: concurrent restarts are neither
    /// serialized nor de-duplicated here.
    pub async fn restart(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<()> {
        let (cluster, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        debug!("Restart definition {}", definition);

        cluster
            .backend()
            .restart(&definition)
            .await
            .map_err(|e| fail(Scope::Definition(&definition), e))
    }

    /// Restart one task of a connector.
    ///
    /// The definition is read first so that a missing connector is reported as
    /// `DefinitionNotFound` and an unknown task id as `TaskNotFound`.
    pub async fn restart_task(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
        task_id: u32,
    ) -> Result<()> {
        let (cluster, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        let task = definition.task(task_id);
        debug!("Restarting task {}", task);

        let current = cluster
            .backend()
            .get_connector(&definition)
            .await
            .map_err(|e| fail(Scope::Definition(&definition), e))?;

        if current.task(task_id).is_none() {
            return Err(ConnectError::TaskNotFound {
                cluster_id: cluster_id.to_string(),
                connect_id: connect_id.to_string(),
                definition_id: definition_id.to_string(),
                task_id,
            });
        }

        cluster
            .backend()
            .restart_task(&task)
            .await
            .map_err(|e| fail(Scope::Task(&task), e))
    }

    /// Delete a connector and return the worker group's remaining connectors.
    ///
    /// Deleting a connector that does not exist is `DefinitionNotFound`.
    pub async fn delete(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<Vec<ConnectDefinition>> {
        let (cluster, definition) = self.definition(cluster_id, connect_id, definition_id)?;
        debug!("Deleting definition {}", definition);

        cluster
            .backend()
            .delete_connector(&definition)
            .await
            .map_err(|e| fail(Scope::Definition(&definition), e))?;

        list_sorted(cluster, &definition.worker).await
    }

    fn worker(
        &self,
        cluster_id: &str,
        connect_id: &str,
    ) -> Result<(&Cluster, ConnectWorkerRef)> {
        validate_identifier("clusterId", cluster_id)?;
        validate_identifier("connectId", connect_id)?;

        let cluster = self.registry.resolve_cluster(cluster_id)?;
        let worker = cluster.resolve_worker(connect_id)?;
        Ok((cluster, worker))
    }

    fn definition(
        &self,
        cluster_id: &str,
        connect_id: &str,
        definition_id: &str,
    ) -> Result<(&Cluster, ConnectDefinitionRef)> {
        validate_identifier("definitionId", definition_id)?;

        let (cluster, worker) = self.worker(cluster_id, connect_id)?;
        Ok((cluster, worker.definition(definition_id)))
    }
}

async fn list_sorted(
    cluster: &Cluster,
    worker: &ConnectWorkerRef,
) -> Result<Vec<ConnectDefinition>> {
    let mut definitions = cluster
        .backend()
        .list_connectors(worker)
        .await
        .map_err(|e| fail(Scope::Worker(worker), e))?;

    definitions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(definitions)
}

fn fail(scope: Scope<'_>, err: BackendError) -> ConnectError {
    let err = scope.normalize(err);
    warn!("{}", err);
    err
}
