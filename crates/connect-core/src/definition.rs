use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Run state reported by Kafka Connect for a connector or a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectorState {
    Unassigned,
    Running,
    Paused,
    Stopped,
    Failed,
    Restarting,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorType {
    Source,
    Sink,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectTask {
    pub id: u32,
    pub state: ConnectorState,
    pub worker_id: Option<String>,
    /// Stack trace reported by the worker when the task failed
    #[serde(default)]
    pub trace: Option<String>,
}

/// Snapshot of a connector: configuration, run state and tasks.
///
/// Always fetched fresh from the backend; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub connector_type: ConnectorType,

    pub config: BTreeMap<String, String>,

    pub state: ConnectorState,

    /// Worker currently running the connector instance
    pub worker_id: Option<String>,

    #[serde(default)]
    pub trace: Option<String>,

    /// Tasks ordered by id
    pub tasks: Vec<ConnectTask>,
}

impl ConnectDefinition {
    pub fn new(name: impl Into<String>, connector_type: ConnectorType) -> Self {
        Self {
            name: name.into(),
            connector_type,
            config: BTreeMap::new(),
            state: ConnectorState::Running,
            worker_id: None,
            trace: None,
            tasks: Vec::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_task(mut self, id: u32, state: ConnectorState) -> Self {
        self.tasks.push(ConnectTask {
            id,
            state,
            worker_id: None,
            trace: None,
        });
        self.tasks.sort_by_key(|t| t.id);
        self
    }

    pub fn task(&self, id: u32) -> Option<&ConnectTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The `connector.class` entry of the configuration
    pub fn class_name(&self) -> Option<&str> {
        self.config.get("connector.class").map(String::as_str)
    }

    pub fn is_paused(&self) -> bool {
        self.state == ConnectorState::Paused
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &ConnectTask> {
        self.tasks
            .iter()
            .filter(|t| t.state == ConnectorState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_states_deserialize() {
        let state: ConnectorState = serde_json::from_value(json!("DESTROYED")).unwrap();
        assert_eq!(state, ConnectorState::Unknown);

        let kind: ConnectorType = serde_json::from_value(json!("mirror")).unwrap();
        assert_eq!(kind, ConnectorType::Unknown);
    }

    #[test]
    fn test_tasks_stay_ordered() {
        let definition = ConnectDefinition::new("orders-sink", ConnectorType::Sink)
            .with_config("connector.class", "io.confluent.connect.jdbc.JdbcSinkConnector")
            .with_task(1, ConnectorState::Failed)
            .with_task(0, ConnectorState::Running);

        let ids: Vec<u32> = definition.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(definition.failed_tasks().count(), 1);
        assert_eq!(
            definition.class_name(),
            Some("io.confluent.connect.jdbc.JdbcSinkConnector")
        );
        assert!(definition.task(7).is_none());
    }
}
