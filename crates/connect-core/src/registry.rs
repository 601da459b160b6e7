use crate::{
    validate_identifier, ClusterRef, ConnectBackend, ConnectError, ConnectWorkerRef, Result,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A configured cluster: its worker groups and the backend that reaches them.
pub struct Cluster {
    reference: ClusterRef,
    connect_ids: Vec<String>,
    backend: Arc<dyn ConnectBackend>,
}

impl Cluster {
    pub fn reference(&self) -> &ClusterRef {
        &self.reference
    }

    /// Worker group ids in configuration order
    pub fn connect_ids(&self) -> &[String] {
        &self.connect_ids
    }

    pub fn backend(&self) -> &dyn ConnectBackend {
        self.backend.as_ref()
    }

    /// Resolve a worker group of this cluster.
    pub fn resolve_worker(&self, connect_id: &str) -> Result<ConnectWorkerRef> {
        validate_identifier("connectId", connect_id)?;

        if !self.connect_ids.iter().any(|id| id == connect_id) {
            return Err(ConnectError::UnknownConnectWorker {
                cluster_id: self.reference.cluster_id.clone(),
                connect_id: connect_id.to_string(),
            });
        }

        Ok(ConnectWorkerRef::new(self.reference.clone(), connect_id))
    }

    pub fn workers(&self) -> impl Iterator<Item = ConnectWorkerRef> + '_ {
        self.connect_ids
            .iter()
            .map(|id| ConnectWorkerRef::new(self.reference.clone(), id.as_str()))
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("reference", &self.reference)
            .field("connect_ids", &self.connect_ids)
            .finish_non_exhaustive()
    }
}

/// Registry of the clusters known to the facade.
///
/// Built once at startup and read-only afterwards.
#[derive(Default)]
pub struct ClusterRegistry {
    clusters: HashMap<String, Cluster>,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster with its worker groups and backend
    pub fn register_cluster(
        &mut self,
        cluster_id: impl Into<String>,
        connect_ids: Vec<String>,
        backend: Arc<dyn ConnectBackend>,
    ) -> Result<()> {
        let cluster_id = cluster_id.into();
        validate_identifier("clusterId", &cluster_id)?;

        if self.clusters.contains_key(&cluster_id) {
            return Err(ConnectError::Configuration(format!(
                "Cluster '{}' is already registered",
                cluster_id
            )));
        }
        if connect_ids.is_empty() {
            return Err(ConnectError::Configuration(format!(
                "Cluster '{}' has no connect workers",
                cluster_id
            )));
        }
        for (idx, connect_id) in connect_ids.iter().enumerate() {
            validate_identifier("connectId", connect_id)?;
            if connect_ids[..idx].contains(connect_id) {
                return Err(ConnectError::Configuration(format!(
                    "Connect '{}' is declared twice in cluster '{}'",
                    connect_id, cluster_id
                )));
            }
        }

        let cluster = Cluster {
            reference: ClusterRef::new(cluster_id.clone()),
            connect_ids,
            backend,
        };
        self.clusters.insert(cluster_id, cluster);
        Ok(())
    }

    /// Resolve a cluster by id
    pub fn resolve_cluster(&self, cluster_id: &str) -> Result<&Cluster> {
        validate_identifier("clusterId", cluster_id)?;

        self.clusters
            .get(cluster_id)
            .ok_or_else(|| ConnectError::UnknownCluster {
                cluster_id: cluster_id.to_string(),
            })
    }

    /// List all registered cluster ids, sorted
    pub fn list_clusters(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.clusters.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
