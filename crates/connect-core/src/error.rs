use crate::{ConnectDefinitionRef, ConnectTaskRef, ConnectWorkerRef};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors reported by a [`ConnectBackend`](crate::ConnectBackend) implementation.
///
/// Backends know nothing about clusters or addressing; the facade attaches the
/// resolved identifiers when it turns these into a [`ConnectError`].
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("connector not found")]
    NotFound,

    #[error("task not found")]
    TaskNotFound,

    #[error("connector is already in the requested state")]
    AlreadyInState,

    #[error("backend unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),

    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

impl BackendError {
    pub fn unavailable(cause: impl Into<anyhow::Error>) -> Self {
        Self::Unavailable(cause.into())
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Invalid identifier: {field} must not be empty")]
    InvalidIdentifier { field: &'static str },

    #[error("Unknown cluster '{cluster_id}'")]
    UnknownCluster { cluster_id: String },

    #[error("Unknown connect '{connect_id}' on cluster '{cluster_id}'")]
    UnknownConnectWorker {
        cluster_id: String,
        connect_id: String,
    },

    #[error("Connector '{definition_id}' not found on connect '{connect_id}' (cluster '{cluster_id}')")]
    DefinitionNotFound {
        cluster_id: String,
        connect_id: String,
        definition_id: String,
    },

    #[error("Task {task_id} not found for connector '{definition_id}' on connect '{connect_id}' (cluster '{cluster_id}')")]
    TaskNotFound {
        cluster_id: String,
        connect_id: String,
        definition_id: String,
        task_id: u32,
    },

    #[error("Connect '{connect_id}' on cluster '{cluster_id}' is unavailable: {source}")]
    BackendUnavailable {
        cluster_id: String,
        connect_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Connect '{connect_id}' on cluster '{cluster_id}' rejected the request ({status}): {message}")]
    BackendRejected {
        cluster_id: String,
        connect_id: String,
        status: u16,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ConnectError {
    /// Whether the same call may succeed if the caller tries again later.
    ///
    /// Addressing and not-found errors are permanent for the given input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendUnavailable { .. } => true,
            Self::BackendRejected { status, .. } => *status == 409 || *status >= 500,
            _ => false,
        }
    }
}

/// Target of a backend call, used to attach identifiers to backend failures.
pub(crate) enum Scope<'a> {
    Worker(&'a ConnectWorkerRef),
    Definition(&'a ConnectDefinitionRef),
    Task(&'a ConnectTaskRef),
}

impl Scope<'_> {
    fn worker(&self) -> &ConnectWorkerRef {
        match self {
            Scope::Worker(worker) => worker,
            Scope::Definition(definition) => &definition.worker,
            Scope::Task(task) => &task.definition.worker,
        }
    }

    fn definition(&self) -> Option<&ConnectDefinitionRef> {
        match self {
            Scope::Worker(_) => None,
            Scope::Definition(definition) => Some(definition),
            Scope::Task(task) => Some(&task.definition),
        }
    }

    /// Map a backend failure into the caller-facing taxonomy.
    ///
    /// Not-found reports only become `DefinitionNotFound`/`TaskNotFound` when the
    /// call actually targeted a definition/task; anything else keeps its cause as
    /// a rejection so it is never mistaken for a missing connector.
    pub(crate) fn normalize(&self, err: BackendError) -> ConnectError {
        let worker = self.worker();
        let cluster_id = worker.cluster.cluster_id.clone();
        let connect_id = worker.connect_id.clone();

        match (err, self.definition()) {
            (BackendError::Unavailable(source), _) => ConnectError::BackendUnavailable {
                cluster_id,
                connect_id,
                source,
            },
            (BackendError::Rejected { status, message }, _) => ConnectError::BackendRejected {
                cluster_id,
                connect_id,
                status,
                message,
            },
            (BackendError::NotFound, Some(definition)) => ConnectError::DefinitionNotFound {
                cluster_id,
                connect_id,
                definition_id: definition.definition_id.clone(),
            },
            (BackendError::TaskNotFound, Some(definition)) => match self {
                Scope::Task(task) => ConnectError::TaskNotFound {
                    cluster_id,
                    connect_id,
                    definition_id: definition.definition_id.clone(),
                    task_id: task.task_id,
                },
                _ => ConnectError::DefinitionNotFound {
                    cluster_id,
                    connect_id,
                    definition_id: definition.definition_id.clone(),
                },
            },
            (err @ (BackendError::NotFound | BackendError::TaskNotFound), None) => {
                ConnectError::BackendRejected {
                    cluster_id,
                    connect_id,
                    status: 404,
                    message: err.to_string(),
                }
            }
            (err @ BackendError::AlreadyInState, _) => ConnectError::BackendRejected {
                cluster_id,
                connect_id,
                status: 409,
                message: err.to_string(),
            },
        }
    }
}
