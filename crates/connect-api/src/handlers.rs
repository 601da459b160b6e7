use axum::extract::State;
use chrono::{DateTime, Utc};
use connect_core::ConnectFacade;
use serde::Serialize;
use std::sync::Arc;

use crate::ApiResponse;

pub mod connects;

#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<ConnectFacade>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(facade: Arc<ConnectFacade>) -> Self {
        Self {
            facade,
            started_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub clusters: usize,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let response = HealthResponse {
        status: "healthy".to_string(),
        started_at: state.started_at,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        clusters: state.facade.registry().len(),
    };

    ApiResponse::success(response, "System is healthy")
}
