use crate::{
    BackendError, ConnectBackend, ConnectDefinition, ConnectDefinitionRef, ConnectTaskRef,
    ConnectWorkerRef, ConnectorState,
};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

/// A call received by [`MemoryConnectBackend`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ListConnectorNames(ConnectWorkerRef),
    GetConnector(ConnectDefinitionRef),
    ListConnectors(ConnectWorkerRef),
    Pause(ConnectDefinitionRef),
    Resume(ConnectDefinitionRef),
    Restart(ConnectDefinitionRef),
    RestartTask(ConnectTaskRef),
    DeleteConnector(ConnectDefinitionRef),
}

#[derive(Default)]
struct MemoryState {
    // connect id -> connector name -> definition
    connectors: HashMap<String, BTreeMap<String, ConnectDefinition>>,
    unavailable: HashSet<String>,
    broken_details: HashSet<(String, String)>,
    report_already_in_state: bool,
    calls: Vec<BackendCall>,
}

impl MemoryState {
    fn check_available(&self, connect_id: &str) -> Result<(), BackendError> {
        if self.unavailable.contains(connect_id) {
            return Err(BackendError::unavailable(anyhow!(
                "connect '{}' is unreachable",
                connect_id
            )));
        }
        Ok(())
    }

    fn detail(&self, definition: &ConnectDefinitionRef) -> Result<ConnectDefinition, BackendError> {
        let connect_id = definition.connect_id();
        self.check_available(connect_id)?;

        let key = (connect_id.to_string(), definition.definition_id.clone());
        if self.broken_details.contains(&key) {
            return Err(BackendError::unavailable(anyhow!(
                "failed to fetch connector '{}'",
                definition.definition_id
            )));
        }

        self.connectors
            .get(connect_id)
            .and_then(|defs| defs.get(&definition.definition_id))
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    fn detail_mut(
        &mut self,
        definition: &ConnectDefinitionRef,
    ) -> Result<&mut ConnectDefinition, BackendError> {
        self.check_available(definition.connect_id())?;

        self.connectors
            .get_mut(definition.connect_id())
            .and_then(|defs| defs.get_mut(&definition.definition_id))
            .ok_or(BackendError::NotFound)
    }

    fn transition(
        &mut self,
        definition: &ConnectDefinitionRef,
        target: ConnectorState,
    ) -> Result<(), BackendError> {
        let strict = self.report_already_in_state;
        let current = self.detail_mut(definition)?;

        if strict && current.state == target {
            return Err(BackendError::AlreadyInState);
        }

        current.state = target;
        for task in current.tasks.iter_mut() {
            task.state = target;
        }
        Ok(())
    }
}

/// In-memory administration backend used as a test double.
///
/// Holds connector definitions per worker group, records every call it
/// receives, and can be told to fail. The call log is never trimmed, so use
/// [`MemoryConnectBackend::clear_calls`] in long-running tests. Only built
/// for tests or with the `testing` feature.
#[derive(Default)]
pub struct MemoryConnectBackend {
    state: Mutex<MemoryState>,
}

impl MemoryConnectBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a connector on a worker group
    pub async fn insert(&self, connect_id: &str, definition: ConnectDefinition) {
        let mut state = self.state.lock().await;
        state
            .connectors
            .entry(connect_id.to_string())
            .or_default()
            .insert(definition.name.clone(), definition);
    }

    /// Make every call against `connect_id` fail as unreachable
    pub async fn set_unavailable(&self, connect_id: &str, unavailable: bool) {
        let mut state = self.state.lock().await;
        if unavailable {
            state.unavailable.insert(connect_id.to_string());
        } else {
            state.unavailable.remove(connect_id);
        }
    }

    /// Make detail fetches of one connector fail while its name stays listed
    pub async fn break_detail(&self, connect_id: &str, name: &str) {
        let mut state = self.state.lock().await;
        state
            .broken_details
            .insert((connect_id.to_string(), name.to_string()));
    }

    /// Report `AlreadyInState` when pausing a paused connector or resuming a
    /// running one, the way a stricter Connect API would
    pub async fn report_already_in_state(&self, enabled: bool) {
        self.state.lock().await.report_already_in_state = enabled;
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

#[async_trait]
impl ConnectBackend for MemoryConnectBackend {
    async fn list_connector_names(
        &self,
        worker: &ConnectWorkerRef,
    ) -> Result<Vec<String>, BackendError> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(BackendCall::ListConnectorNames(worker.clone()));
        state.check_available(&worker.connect_id)?;

        Ok(state
            .connectors
            .get(&worker.connect_id)
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_connector(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> Result<ConnectDefinition, BackendError> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(BackendCall::GetConnector(definition.clone()));
        state.detail(definition)
    }

    async fn list_connectors(
        &self,
        worker: &ConnectWorkerRef,
    ) -> Result<Vec<ConnectDefinition>, BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::ListConnectors(worker.clone()));
        state.check_available(&worker.connect_id)?;

        let names: Vec<String> = state
            .connectors
            .get(&worker.connect_id)
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default();

        names
            .into_iter()
            .map(|name| state.detail(&worker.definition(name)))
            .collect()
    }

    async fn pause(&self, definition: &ConnectDefinitionRef) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Pause(definition.clone()));
        state.transition(definition, ConnectorState::Paused)
    }

    async fn resume(&self, definition: &ConnectDefinitionRef) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Resume(definition.clone()));
        state.transition(definition, ConnectorState::Running)
    }

    async fn restart(&self, definition: &ConnectDefinitionRef) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::Restart(definition.clone()));

        let current = state.detail_mut(definition)?;
        current.state = ConnectorState::Running;
        current.trace = None;
        for task in current
            .tasks
            .iter_mut()
            .filter(|t| t.state == ConnectorState::Failed)
        {
            task.state = ConnectorState::Running;
            task.trace = None;
        }
        Ok(())
    }

    async fn restart_task(&self, task: &ConnectTaskRef) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state.calls.push(BackendCall::RestartTask(task.clone()));

        let current = state.detail_mut(&task.definition)?;
        let target = current
            .tasks
            .iter_mut()
            .find(|t| t.id == task.task_id)
            .ok_or(BackendError::TaskNotFound)?;
        target.state = ConnectorState::Running;
        target.trace = None;
        Ok(())
    }

    async fn delete_connector(
        &self,
        definition: &ConnectDefinitionRef,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(BackendCall::DeleteConnector(definition.clone()));
        state.check_available(definition.connect_id())?;

        state
            .connectors
            .get_mut(definition.connect_id())
            .and_then(|defs| defs.remove(&definition.definition_id))
            .map(|_| ())
            .ok_or(BackendError::NotFound)
    }
}
