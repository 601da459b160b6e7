mod factory;
mod rest_backend;

#[cfg(test)]
mod fake_connect;

pub use factory::RestBackendFactory;
pub use rest_backend::{RestConnectBackend, RestWorkerConfig};
