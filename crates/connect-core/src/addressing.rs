use crate::{ConnectError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reject empty identifiers before any lookup happens.
///
/// Identifiers are opaque and case-sensitive: no trimming or case folding is
/// applied, so `" prod"` and `"prod"` are different clusters.
pub fn validate_identifier(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConnectError::InvalidIdentifier { field });
    }
    Ok(())
}

/// One configured Kafka Connect deployment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterRef {
    pub cluster_id: String,
}

impl ClusterRef {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }
}

impl fmt::Display for ClusterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cluster_id)
    }
}

/// A Connect worker group inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectWorkerRef {
    pub cluster: ClusterRef,
    pub connect_id: String,
}

impl ConnectWorkerRef {
    pub fn new(cluster: ClusterRef, connect_id: impl Into<String>) -> Self {
        Self {
            cluster,
            connect_id: connect_id.into(),
        }
    }

    pub fn definition(&self, definition_id: impl Into<String>) -> ConnectDefinitionRef {
        ConnectDefinitionRef {
            worker: self.clone(),
            definition_id: definition_id.into(),
        }
    }
}

impl fmt::Display for ConnectWorkerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.connect_id)
    }
}

/// A connector definition hosted by a worker group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectDefinitionRef {
    pub worker: ConnectWorkerRef,
    pub definition_id: String,
}

impl ConnectDefinitionRef {
    pub fn task(&self, task_id: u32) -> ConnectTaskRef {
        ConnectTaskRef {
            definition: self.clone(),
            task_id,
        }
    }

    pub fn connect_id(&self) -> &str {
        &self.worker.connect_id
    }
}

impl fmt::Display for ConnectDefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.worker, self.definition_id)
    }
}

/// A single task of a connector definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectTaskRef {
    pub definition: ConnectDefinitionRef,
    pub task_id: u32,
}

impl fmt::Display for ConnectTaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.definition, self.task_id)
    }
}
