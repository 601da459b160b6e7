use anyhow::anyhow;
use async_trait::async_trait;
use connect_core::{
    BackendError, ConnectBackend, ConnectDefinition, ConnectDefinitionRef, ConnectError,
    ConnectTask, ConnectTaskRef, ConnectWorkerRef, ConnectorState, ConnectorType, Result,
};
use futures::future::try_join_all;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestWorkerConfig {
    /// Connect worker group id, as used in requests
    pub id: String,

    /// Base URL of the Kafka Connect REST API (e.g. "http://connect:8083")
    pub url: String,

    /// Optional username for basic authentication
    #[serde(default)]
    pub basic_auth_username: Option<String>,

    /// Optional password for basic authentication
    #[serde(default)]
    pub basic_auth_password: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl RestWorkerConfig {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            basic_auth_username: None,
            basic_auth_password: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

// Kafka Connect REST payloads

#[derive(Debug, Deserialize)]
struct ConnectorInfo {
    config: BTreeMap<String, String>,
    #[serde(default)]
    tasks: Vec<TaskId>,
    #[serde(rename = "type", default = "unknown_type")]
    connector_type: ConnectorType,
}

fn unknown_type() -> ConnectorType {
    ConnectorType::Unknown
}

#[derive(Debug, Deserialize)]
struct TaskId {
    task: u32,
}

#[derive(Debug, Deserialize)]
struct ConnectorStatus {
    connector: StateInfo,
    #[serde(default)]
    tasks: Vec<TaskStatus>,
}

#[derive(Debug, Deserialize)]
struct StateInfo {
    state: ConnectorState,
    worker_id: Option<String>,
    #[serde(default)]
    trace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    id: u32,
    state: ConnectorState,
    worker_id: Option<String>,
    #[serde(default)]
    trace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

struct WorkerEndpoint {
    base_url: Url,
    client: Client,
    username: Option<String>,
    password: Option<String>,
}

impl WorkerEndpoint {
    fn url(&self, segments: &[&str]) -> std::result::Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                BackendError::unavailable(anyhow!("'{}' cannot be used as a base url", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> std::result::Result<Response, BackendError> {
        let response = request.send().await.map_err(BackendError::unavailable)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string(),
        };
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> std::result::Result<T, BackendError> {
        let url = self.url(segments)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        response.json::<T>().await.map_err(|e| {
            BackendError::unavailable(
                anyhow::Error::new(e).context("invalid response from Kafka Connect"),
            )
        })
    }

    async fn call(&self, method: Method, url: Url) -> std::result::Result<(), BackendError> {
        self.send(self.request(method, url)).await.map(|_| ())
    }

    async fn fetch_connector(
        &self,
        name: &str,
    ) -> std::result::Result<ConnectDefinition, BackendError> {
        let info_path = ["connectors", name];
        let status_path = ["connectors", name, "status"];
        let (info, status) = futures::try_join!(
            self.get_json::<ConnectorInfo>(&info_path),
            self.get_json::<ConnectorStatus>(&status_path),
        )?;
        Ok(merge(name, info, status))
    }
}

/// Combine the configuration and status endpoints into one snapshot.
///
/// A task listed in the configuration but not yet in the status is reported
/// as unassigned.
fn merge(name: &str, info: ConnectorInfo, status: ConnectorStatus) -> ConnectDefinition {
    let mut tasks: BTreeMap<u32, ConnectTask> = info
        .tasks
        .iter()
        .map(|t| {
            let task = ConnectTask {
                id: t.task,
                state: ConnectorState::Unassigned,
                worker_id: None,
                trace: None,
            };
            (t.task, task)
        })
        .collect();

    for t in status.tasks {
        tasks.insert(
            t.id,
            ConnectTask {
                id: t.id,
                state: t.state,
                worker_id: t.worker_id,
                trace: t.trace,
            },
        );
    }

    ConnectDefinition {
        name: name.to_string(),
        connector_type: info.connector_type,
        config: info.config,
        state: status.connector.state,
        worker_id: status.connector.worker_id,
        trace: status.connector.trace,
        tasks: tasks.into_values().collect(),
    }
}

/// Administration backend talking to the Kafka Connect REST API of every
/// worker group of one cluster.
pub struct RestConnectBackend {
    cluster_id: String,
    endpoints: HashMap<String, WorkerEndpoint>,
}

impl RestConnectBackend {
    pub fn new(cluster_id: impl Into<String>, workers: Vec<RestWorkerConfig>) -> Result<Self> {
        let cluster_id = cluster_id.into();
        let mut endpoints = HashMap::new();

        for worker in workers {
            let base_url = Url::parse(&worker.url).map_err(|e| {
                ConnectError::Configuration(format!(
                    "Invalid url '{}' for connect '{}': {}",
                    worker.url, worker.id, e
                ))
            })?;

            let client = Client::builder()
                .timeout(Duration::from_millis(worker.timeout_ms))
                .user_agent(format!("connect-facade/{}", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| ConnectError::Configuration(format!("HTTP client error: {}", e)))?;

            info!(
                "[{}] Connect '{}' at {}",
                cluster_id, worker.id, base_url
            );
            endpoints.insert(
                worker.id,
                WorkerEndpoint {
                    base_url,
                    client,
                    username: worker.basic_auth_username,
                    password: worker.basic_auth_password,
                },
            );
        }

        Ok(Self {
            cluster_id,
            endpoints,
        })
    }

    fn endpoint(&self, connect_id: &str) -> std::result::Result<&WorkerEndpoint, BackendError> {
        self.endpoints.get(connect_id).ok_or_else(|| {
            BackendError::unavailable(anyhow!(
                "no endpoint configured for connect '{}' in cluster '{}'",
                connect_id,
                self.cluster_id
            ))
        })
    }
}

#[async_trait]
impl ConnectBackend for RestConnectBackend {
    async fn list_connector_names(
        &self,
        worker: &ConnectWorkerRef,
    ) -> std::result::Result<Vec<String>, BackendError> {
        let endpoint = self.endpoint(&worker.connect_id)?;
        endpoint.get_json(&["connectors"]).await
    }

    async fn get_connector(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> std::result::Result<ConnectDefinition, BackendError> {
        let endpoint = self.endpoint(definition.connect_id())?;
        endpoint.fetch_connector(&definition.definition_id).await
    }

    async fn list_connectors(
        &self,
        worker: &ConnectWorkerRef,
    ) -> std::result::Result<Vec<ConnectDefinition>, BackendError> {
        let endpoint = self.endpoint(&worker.connect_id)?;
        let names: Vec<String> = endpoint.get_json(&["connectors"]).await?;
        debug!("[{}] {} connector(s) on {}", self.cluster_id, names.len(), worker.connect_id);

        // A connector deleted between the two calls still fails the whole listing
        try_join_all(names.iter().map(|name| endpoint.fetch_connector(name))).await
    }

    async fn pause(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> std::result::Result<(), BackendError> {
        let endpoint = self.endpoint(definition.connect_id())?;
        let url = endpoint.url(&["connectors", definition.definition_id.as_str(), "pause"])?;
        endpoint.call(Method::PUT, url).await
    }

    async fn resume(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> std::result::Result<(), BackendError> {
        let endpoint = self.endpoint(definition.connect_id())?;
        let url = endpoint.url(&["connectors", definition.definition_id.as_str(), "resume"])?;
        endpoint.call(Method::PUT, url).await
    }

    async fn restart(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> std::result::Result<(), BackendError> {
        let endpoint = self.endpoint(definition.connect_id())?;
        let mut url = endpoint.url(&["connectors", definition.definition_id.as_str(), "restart"])?;
        // Workers older than 3.0 ignore these and restart the connector instance only
        url.query_pairs_mut()
            .append_pair("includeTasks", "true")
            .append_pair("onlyFailed", "true");
        endpoint.call(Method::POST, url).await
    }

    async fn restart_task(&self, task: &ConnectTaskRef) -> std::result::Result<(), BackendError> {
        let endpoint = self.endpoint(task.definition.connect_id())?;
        let task_id = task.task_id.to_string();
        let url = endpoint.url(&[
            "connectors",
            task.definition.definition_id.as_str(),
            "tasks",
            task_id.as_str(),
            "restart",
        ])?;

        match endpoint.call(Method::POST, url).await {
            Err(BackendError::NotFound) => Err(BackendError::TaskNotFound),
            other => other,
        }
    }

    async fn delete_connector(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> std::result::Result<(), BackendError> {
        let endpoint = self.endpoint(definition.connect_id())?;
        let url = endpoint.url(&["connectors", definition.definition_id.as_str()])?;
        endpoint.call(Method::DELETE, url).await
    }
}
