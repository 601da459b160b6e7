use crate::handlers::{connects, health_check, AppState};
use axum::{
    routing::{delete, get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub struct ApiServer {
    host: String,
    port: u16,
    cors_enabled: bool,
    state: AppState,
}

impl ApiServer {
    pub fn new(host: String, port: u16, cors_enabled: bool, state: AppState) -> Self {
        Self {
            host,
            port,
            cors_enabled,
            state,
        }
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/api/clusters", get(connects::list_clusters))
            .route("/api/connects", get(connects::list_connects))
            .route("/api/connectors", get(connects::list_connector_names))
            // Connector definitions
            .route("/api/connect/definition", get(connects::get_definition))
            .route("/api/connect/definitions", get(connects::list_definitions))
            .route(
                "/api/connect/definition/pause",
                put(connects::pause_definition),
            )
            .route(
                "/api/connect/definition/resume",
                put(connects::resume_definition),
            )
            .route(
                "/api/connect/definition/restart",
                put(connects::restart_definition),
            )
            .route(
                "/api/connect/definition/task/restart",
                put(connects::restart_task),
            )
            .route("/api/connect/delete", delete(connects::delete_definition))
            .with_state(state)
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let mut app = Self::router(self.state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        if self.cors_enabled {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);

            app = app.layer(cors);
        }

        let addr = format!("{}:{}", self.host, self.port);
        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use connect_core::{
        ClusterRegistry, ConnectDefinition, ConnectFacade, ConnectorState, ConnectorType,
        MemoryConnectBackend,
    };
    use http_body_util::BodyExt as _;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt; // for Router::oneshot

    async fn app() -> (Router, Arc<MemoryConnectBackend>) {
        let backend = Arc::new(MemoryConnectBackend::new());
        backend
            .insert(
                "connect-a",
                ConnectDefinition::new("orders-sink", ConnectorType::Sink)
                    .with_task(0, ConnectorState::Running)
                    .with_task(1, ConnectorState::Running),
            )
            .await;
        backend
            .insert(
                "connect-a",
                ConnectDefinition::new("users-source", ConnectorType::Source),
            )
            .await;

        let mut registry = ClusterRegistry::new();
        registry
            .register_cluster("prod-1", vec!["connect-a".to_string()], backend.clone())
            .unwrap();
        let state = AppState::new(Arc::new(ConnectFacade::new(registry)));

        (ApiServer::router(state), backend)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_and_clusters() {
        let (app, _) = app().await;

        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["clusters"], 1);

        let (status, body) = send(&app, "GET", "/api/clusters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["prod-1"]));
    }

    #[tokio::test]
    async fn test_list_connects_and_connectors() {
        let (app, _) = app().await;

        let (status, body) = send(&app, "GET", "/api/connects?clusterId=prod-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["connect-a"]));

        let (status, body) = send(&app, "GET", "/api/connectors?clusterId=prod-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!(["orders-sink", "users-source"]));

        let (status, body) = send(&app, "GET", "/api/connectors?clusterId=prod-9", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = send(&app, "GET", "/api/connectors", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_definition() {
        let (app, _) = app().await;

        let (status, body) = send(
            &app,
            "GET",
            "/api/connect/definition?clusterId=prod-1&connectId=connect-a&definitionId=orders-sink",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "orders-sink");
        assert_eq!(body["data"]["type"], "sink");
        assert_eq!(body["data"]["state"], "RUNNING");

        let (status, _) = send(
            &app,
            "GET",
            "/api/connect/definition?clusterId=prod-1&connectId=connect-a&definitionId=ghost",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pause_then_list_definitions() {
        let (app, _) = app().await;
        let request = json!({
            "clusterId": "prod-1",
            "connectId": "connect-a",
            "definitionId": "orders-sink"
        });

        let (status, _) = send(&app, "PUT", "/api/connect/definition/pause", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "PUT", "/api/connect/definition/pause", Some(request)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "GET",
            "/api/connect/definitions?clusterId=prod-1&connectId=connect-a",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["state"], "PAUSED");
        assert_eq!(body["data"][1]["state"], "RUNNING");
    }

    #[tokio::test]
    async fn test_restart_task() {
        let (app, _) = app().await;

        let (status, _) = send(
            &app,
            "PUT",
            "/api/connect/definition/task/restart",
            Some(json!({
                "clusterId": "prod-1",
                "connectId": "connect-a",
                "definitionId": "orders-sink",
                "taskId": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/connect/definition/task/restart",
            Some(json!({
                "clusterId": "prod-1",
                "connectId": "connect-a",
                "definitionId": "orders-sink",
                "taskId": 7
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_returns_remaining() {
        let (app, _) = app().await;
        let request = json!({
            "clusterId": "prod-1",
            "connectId": "connect-a",
            "definitionId": "orders-sink"
        });

        let (status, body) = send(&app, "DELETE", "/api/connect/delete", Some(request.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["data"][0]["name"], "users-source");

        let (status, _) = send(&app, "DELETE", "/api/connect/delete", Some(request)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreachable_connect_is_service_unavailable() {
        let (app, backend) = app().await;
        backend.set_unavailable("connect-a", true).await;

        let (status, body) = send(
            &app,
            "GET",
            "/api/connect/definitions?clusterId=prod-1&connectId=connect-a",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_bad_request() {
        let (app, backend) = app().await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/connect/definition/task/restart",
            Some(json!({
                "clusterId": "prod-1",
                "connectId": "connect-a",
                "definitionId": "orders-sink"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["errors"][0].as_str().unwrap().contains("taskId"));

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/connect/definition/pause")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");

        assert!(backend.calls().await.is_empty());
    }
}
