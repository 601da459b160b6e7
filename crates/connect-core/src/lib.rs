mod addressing;
mod backend;
mod definition;
mod error;
mod facade;
mod factory;
#[cfg(any(test, feature = "testing"))]
mod memory;
mod registry;

pub use addressing::{
    validate_identifier, ClusterRef, ConnectDefinitionRef, ConnectTaskRef, ConnectWorkerRef,
};
pub use backend::ConnectBackend;
pub use definition::{ConnectDefinition, ConnectTask, ConnectorState, ConnectorType};
pub use error::{BackendError, ConnectError, Result};
pub use facade::ConnectFacade;
pub use factory::ConnectBackendFactory;
#[cfg(any(test, feature = "testing"))]
pub use memory::{BackendCall, MemoryConnectBackend};
pub use registry::{Cluster, ClusterRegistry};
