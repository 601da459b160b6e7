use crate::{RestConnectBackend, RestWorkerConfig};
use connect_core::{ConnectBackend, ConnectBackendFactory, ConnectError, Result};
use serde_json::Value;
use std::sync::Arc;

pub struct RestBackendFactory;

impl ConnectBackendFactory for RestBackendFactory {
    fn name(&self) -> &str {
        "rest"
    }

    fn create(&self, cluster_id: &str, config: Value) -> Result<Arc<dyn ConnectBackend>> {
        let workers: Vec<RestWorkerConfig> = serde_json::from_value(config).map_err(|e| {
            ConnectError::Configuration(format!(
                "Invalid connect configuration for cluster '{}': {}",
                cluster_id, e
            ))
        })?;
        Ok(Arc::new(RestConnectBackend::new(cluster_id, workers)?))
    }
}
