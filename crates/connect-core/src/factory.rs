use crate::{ConnectBackend, Result};
use serde_json::Value;
use std::sync::Arc;

/// Factory trait for creating the administration backend of a cluster
pub trait ConnectBackendFactory: Send + Sync {
    /// Get the name/type identifier for this backend
    fn name(&self) -> &str;

    /// Create a backend for `cluster_id` from its connect worker configuration
    fn create(&self, cluster_id: &str, config: Value) -> Result<Arc<dyn ConnectBackend>>;
}
