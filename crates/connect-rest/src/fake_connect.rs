//! Minimal Kafka Connect REST server for exercising the backend over HTTP.

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

struct FakeConnector {
    state: &'static str,
    tasks: Vec<(u32, &'static str)>,
    broken: bool,
}

#[derive(Default)]
struct FakeState {
    connectors: BTreeMap<String, FakeConnector>,
    requests: Vec<String>,
    last_authorization: Option<String>,
    rebalancing: bool,
}

#[derive(Clone, Default)]
pub(crate) struct FakeConnect {
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnect {
    /// One sink connector with a running task 0 and a failed task 1
    pub(crate) fn with_orders_sink() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().connectors.insert(
            "orders-sink".to_string(),
            FakeConnector {
                state: "RUNNING",
                tasks: vec![(0, "RUNNING"), (1, "FAILED")],
                broken: false,
            },
        );
        fake
    }

    /// A connector that is listed but whose detail endpoints fail
    pub(crate) fn add_broken(&self, name: &str) {
        self.state.lock().unwrap().connectors.insert(
            name.to_string(),
            FakeConnector {
                state: "RUNNING",
                tasks: vec![],
                broken: true,
            },
        );
    }

    pub(crate) fn set_rebalancing(&self, rebalancing: bool) {
        self.state.lock().unwrap().rebalancing = rebalancing;
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub(crate) fn last_authorization(&self) -> Option<String> {
        self.state.lock().unwrap().last_authorization.clone()
    }

    /// Serve on an ephemeral port and return the base url
    pub(crate) async fn serve(&self) -> String {
        let app = Router::new()
            .route("/connectors", get(list))
            .route("/connectors/{name}", get(info).delete(delete))
            .route("/connectors/{name}/status", get(status))
            .route("/connectors/{name}/pause", put(pause))
            .route("/connectors/{name}/resume", put(resume))
            .route("/connectors/{name}/restart", post(restart))
            .route("/connectors/{name}/tasks/{task}/restart", post(restart_task))
            .layer(middleware::from_fn_with_state(self.clone(), record))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn record(State(fake): State<FakeConnect>, request: Request, next: Next) -> Response {
    {
        let mut state = fake.state.lock().unwrap();
        let path = request
            .uri()
            .path_and_query()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default();
        state.requests.push(format!("{} {}", request.method(), path));
        state.last_authorization = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
    }
    next.run(request).await
}

fn error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(json!({"error_code": status.as_u16(), "message": message})),
    )
        .into_response()
}

fn not_found(name: &str) -> Response {
    error(StatusCode::NOT_FOUND, format!("Connector {} not found", name))
}

fn broken(name: &str) -> Response {
    error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("connector {} is broken", name),
    )
}

async fn list(State(fake): State<FakeConnect>) -> Response {
    let state = fake.state.lock().unwrap();
    let names: Vec<&String> = state.connectors.keys().collect();
    Json(json!(names)).into_response()
}

async fn info(State(fake): State<FakeConnect>, Path(name): Path<String>) -> Response {
    let state = fake.state.lock().unwrap();
    match state.connectors.get(&name) {
        None => not_found(&name),
        Some(c) if c.broken => broken(&name),
        Some(c) => {
            let tasks: Vec<_> = c
                .tasks
                .iter()
                .map(|(id, _)| json!({"connector": name, "task": id}))
                .collect();
            Json(json!({
                "name": name,
                "config": {"connector.class": "JdbcSinkConnector", "topics": "orders"},
                "tasks": tasks,
                "type": "sink"
            }))
            .into_response()
        }
    }
}

async fn status(State(fake): State<FakeConnect>, Path(name): Path<String>) -> Response {
    let state = fake.state.lock().unwrap();
    match state.connectors.get(&name) {
        None => not_found(&name),
        Some(c) if c.broken => broken(&name),
        Some(c) => {
            let tasks: Vec<_> = c
                .tasks
                .iter()
                .map(|(id, task_state)| {
                    let mut task = json!({"id": id, "state": task_state, "worker_id": "10.0.0.2:8083"});
                    if *task_state == "FAILED" {
                        task["trace"] = json!("boom");
                    }
                    task
                })
                .collect();
            Json(json!({
                "name": name,
                "connector": {"state": c.state, "worker_id": "10.0.0.1:8083"},
                "tasks": tasks,
                "type": "sink"
            }))
            .into_response()
        }
    }
}

fn set_state(fake: &FakeConnect, name: &str, target: &'static str) -> Response {
    let mut state = fake.state.lock().unwrap();
    match state.connectors.get_mut(name) {
        None => not_found(name),
        Some(c) => {
            c.state = target;
            for task in c.tasks.iter_mut() {
                task.1 = target;
            }
            StatusCode::ACCEPTED.into_response()
        }
    }
}

async fn pause(State(fake): State<FakeConnect>, Path(name): Path<String>) -> Response {
    set_state(&fake, &name, "PAUSED")
}

async fn resume(State(fake): State<FakeConnect>, Path(name): Path<String>) -> Response {
    set_state(&fake, &name, "RUNNING")
}

async fn restart(State(fake): State<FakeConnect>, Path(name): Path<String>) -> Response {
    let rebalancing = fake.state.lock().unwrap().rebalancing;
    if rebalancing {
        return error(
            StatusCode::CONFLICT,
            "Cannot complete request momentarily due to stale configuration".to_string(),
        );
    }
    set_state(&fake, &name, "RUNNING")
}

async fn restart_task(
    State(fake): State<FakeConnect>,
    Path((name, task)): Path<(String, u32)>,
) -> Response {
    let state = fake.state.lock().unwrap();
    match state.connectors.get(&name) {
        Some(c) if c.tasks.iter().any(|(id, _)| *id == task) => {
            StatusCode::NO_CONTENT.into_response()
        }
        _ => error(
            StatusCode::NOT_FOUND,
            format!("Task {}-{} not found", name, task),
        ),
    }
}

async fn delete(State(fake): State<FakeConnect>, Path(name): Path<String>) -> Response {
    let mut state = fake.state.lock().unwrap();
    match state.connectors.remove(&name) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&name),
    }
}
