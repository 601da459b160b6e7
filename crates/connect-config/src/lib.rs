use connect_core::{ClusterRegistry, ConnectBackendFactory};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No clusters configured")]
    NoClusters,

    #[error("Cluster id must not be empty")]
    EmptyClusterId,

    #[error("Cluster '{0}' is declared more than once")]
    DuplicateCluster(String),

    #[error("Cluster '{0}' has no connect workers")]
    NoConnects(String),

    #[error("Connect id must not be empty (cluster '{0}')")]
    EmptyConnectId(String),

    #[error("Connect '{connect_id}' is declared more than once in cluster '{cluster_id}'")]
    DuplicateConnect {
        cluster_id: String,
        connect_id: String,
    },

    #[error("Connect '{connect_id}' in cluster '{cluster_id}' has an invalid url '{url}'")]
    InvalidUrl {
        cluster_id: String,
        connect_id: String,
        url: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub clusters: Vec<ClusterConfig>,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Operator-assigned cluster id
    pub id: String,

    /// Connect worker groups of this cluster
    pub connects: Vec<ConnectConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Worker group id
    pub id: String,

    /// Base URL of the Kafka Connect REST API
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_password: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON formatted logs
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clusters: Vec::new(),
            api: ApiConfig {
                host: "localhost".to_string(),
                port: 8080,
                cors_enabled: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl AppConfig {
    pub fn load(config_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_dir = config_dir.as_ref();
        let s = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&Self::default())?)
            // Add default.yaml
            .add_source(
                config::File::with_name(&config_dir.join("default.yaml").to_string_lossy())
                    .required(false),
            )
            // Add docker.yaml (often used for overrides in containers)
            .add_source(
                config::File::with_name(&config_dir.join("docker.yaml").to_string_lossy())
                    .required(false),
            )
            // Add environment variables (CONNECT_API__PORT=4000)
            .add_source(
                config::Environment::with_prefix("CONNECT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config = s.try_deserialize()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check cluster and connect declarations before anything is wired up
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clusters.is_empty() {
            return Err(ConfigError::NoClusters);
        }

        let mut cluster_ids = HashSet::new();
        for cluster in &self.clusters {
            if cluster.id.is_empty() {
                return Err(ConfigError::EmptyClusterId);
            }
            if !cluster_ids.insert(cluster.id.as_str()) {
                return Err(ConfigError::DuplicateCluster(cluster.id.clone()));
            }
            cluster.validate()?;
        }

        Ok(())
    }

    /// Build the cluster registry, creating one backend per cluster
    pub fn build_registry(
        &self,
        factory: &dyn ConnectBackendFactory,
    ) -> anyhow::Result<ClusterRegistry> {
        self.validate()?;

        let mut registry = ClusterRegistry::new();
        for cluster in &self.clusters {
            let backend = factory.create(&cluster.id, serde_json::to_value(&cluster.connects)?)?;
            registry.register_cluster(cluster.id.clone(), cluster.connect_ids(), backend)?;
        }
        Ok(registry)
    }
}

impl ClusterConfig {
    pub fn connect_ids(&self) -> Vec<String> {
        self.connects.iter().map(|c| c.id.clone()).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.connects.is_empty() {
            return Err(ConfigError::NoConnects(self.id.clone()));
        }

        let mut connect_ids = HashSet::new();
        for connect in &self.connects {
            if connect.id.is_empty() {
                return Err(ConfigError::EmptyConnectId(self.id.clone()));
            }
            if !connect_ids.insert(connect.id.as_str()) {
                return Err(ConfigError::DuplicateConnect {
                    cluster_id: self.id.clone(),
                    connect_id: connect.id.clone(),
                });
            }

            let valid = reqwest::Url::parse(&connect.url)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !valid {
                return Err(ConfigError::InvalidUrl {
                    cluster_id: self.id.clone(),
                    connect_id: connect.id.clone(),
                    url: connect.url.clone(),
                });
            }
        }

        Ok(())
    }
}
