use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use connect_core::ConnectDefinition;
use serde::Deserialize;
use tracing::debug;

use crate::{handlers::AppState, ApiResponse};

// Missing identifiers deserialize to "" and are reported as invalid
// identifiers. Bodies that fail to decode at all become BAD_REQUEST.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQuery {
    #[serde(default)]
    pub cluster_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub connect_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionQuery {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub connect_id: String,
    #[serde(default)]
    pub definition_id: String,
}

/// Body of pause, resume, restart and delete requests
pub type DefinitionRequest = DefinitionQuery;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub connect_id: String,
    #[serde(default)]
    pub definition_id: String,
    pub task_id: u32,
}

pub async fn list_clusters(State(state): State<AppState>) -> ApiResponse<Vec<String>> {
    ApiResponse::success(state.facade.list_clusters(), "Clusters retrieved successfully")
}

pub async fn list_connects(
    State(state): State<AppState>,
    Query(query): Query<ClusterQuery>,
) -> ApiResponse<Vec<String>> {
    match state.facade.list_connect_names(&query.cluster_id) {
        Ok(names) => ApiResponse::success(names, "Connects retrieved successfully"),
        Err(e) => e.into(),
    }
}

pub async fn list_connector_names(
    State(state): State<AppState>,
    Query(query): Query<ClusterQuery>,
) -> ApiResponse<Vec<String>> {
    match state.facade.list_connector_names(&query.cluster_id).await {
        Ok(names) => ApiResponse::success(names, "Connectors retrieved successfully"),
        Err(e) => e.into(),
    }
}

pub async fn get_definition(
    State(state): State<AppState>,
    Query(query): Query<DefinitionQuery>,
) -> ApiResponse<ConnectDefinition> {
    match state
        .facade
        .get_definition(&query.cluster_id, &query.connect_id, &query.definition_id)
        .await
    {
        Ok(definition) => ApiResponse::success(definition, "Definition retrieved successfully"),
        Err(e) => e.into(),
    }
}

pub async fn list_definitions(
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
) -> ApiResponse<Vec<ConnectDefinition>> {
    match state
        .facade
        .list_definitions(&query.cluster_id, &query.connect_id)
        .await
    {
        Ok(definitions) => {
            ApiResponse::success(definitions, "Definitions retrieved successfully")
        }
        Err(e) => e.into(),
    }
}

pub async fn pause_definition(
    State(state): State<AppState>,
    payload: Result<Json<DefinitionRequest>, JsonRejection>,
) -> ApiResponse<()> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };
    debug!(
        "Pausing definition {} from connect: {}",
        request.definition_id, request.connect_id
    );
    match state
        .facade
        .pause(&request.cluster_id, &request.connect_id, &request.definition_id)
        .await
    {
        Ok(()) => ApiResponse::<()>::success_no_data("Definition paused"),
        Err(e) => e.into(),
    }
}

pub async fn resume_definition(
    State(state): State<AppState>,
    payload: Result<Json<DefinitionRequest>, JsonRejection>,
) -> ApiResponse<()> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };
    debug!(
        "Resuming definition {} from connect: {}",
        request.definition_id, request.connect_id
    );
    match state
        .facade
        .resume(&request.cluster_id, &request.connect_id, &request.definition_id)
        .await
    {
        Ok(()) => ApiResponse::<()>::success_no_data("Definition resumed"),
        Err(e) => e.into(),
    }
}

pub async fn restart_definition(
    State(state): State<AppState>,
    payload: Result<Json<DefinitionRequest>, JsonRejection>,
) -> ApiResponse<()> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };
    debug!(
        "Restart definition {} from connect: {}",
        request.definition_id, request.connect_id
    );
    match state
        .facade
        .restart(&request.cluster_id, &request.connect_id, &request.definition_id)
        .await
    {
        Ok(()) => ApiResponse::<()>::success_no_data("Definition restarted"),
        Err(e) => e.into(),
    }
}

pub async fn restart_task(
    State(state): State<AppState>,
    payload: Result<Json<TaskRequest>, JsonRejection>,
) -> ApiResponse<()> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };
    debug!(
        "Restarting task {} from definition {} from connect {}",
        request.task_id, request.definition_id, request.connect_id
    );
    match state
        .facade
        .restart_task(
            &request.cluster_id,
            &request.connect_id,
            &request.definition_id,
            request.task_id,
        )
        .await
    {
        Ok(()) => ApiResponse::<()>::success_no_data("Task restarted"),
        Err(e) => e.into(),
    }
}

pub async fn delete_definition(
    State(state): State<AppState>,
    payload: Result<Json<DefinitionRequest>, JsonRejection>,
) -> ApiResponse<Vec<ConnectDefinition>> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection.into(),
    };
    debug!(
        "Deleting definition {} from connect {}",
        request.definition_id, request.connect_id
    );
    match state
        .facade
        .delete(&request.cluster_id, &request.connect_id, &request.definition_id)
        .await
    {
        Ok(remaining) => ApiResponse::success(remaining, "Definition deleted"),
        Err(e) => e.into(),
    }
}
