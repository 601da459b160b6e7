use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use connect_core::ConnectError;
use serde::Serialize;

/// Standard API response structure
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub message: String,
    pub code: String,
    pub errors: Vec<String>,
    /// Whether retrying the same request later may succeed
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            message: message.into(),
            code: "SUCCESS".to_string(),
            errors: vec![],
            retryable: false,
        }
    }

    /// Create a successful response without data
    pub fn success_no_data(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            data: None,
            message: message.into(),
            code: "SUCCESS".to_string(),
            errors: vec![],
            retryable: false,
        }
    }

    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            data: None,
            message: message.into(),
            code: code.into(),
            errors,
            retryable: false,
        }
    }

    /// Translate a control-plane error, keeping its cause chain in `errors`
    pub fn from_error(err: &ConnectError) -> Self {
        let code = match err {
            ConnectError::InvalidIdentifier { .. } => "BAD_REQUEST",
            ConnectError::UnknownCluster { .. }
            | ConnectError::UnknownConnectWorker { .. }
            | ConnectError::DefinitionNotFound { .. }
            | ConnectError::TaskNotFound { .. } => "NOT_FOUND",
            ConnectError::BackendRejected { status: 409, .. } => "CONFLICT",
            ConnectError::BackendRejected { .. } => "BAD_GATEWAY",
            ConnectError::BackendUnavailable { .. } => "UNAVAILABLE",
            ConnectError::Configuration(_) => "INTERNAL_ERROR",
        };

        let mut errors = Vec::new();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            errors.push(cause.to_string());
            source = cause.source();
        }

        let mut response = Self::error(code, err.to_string(), errors);
        response.retryable = err.is_retryable();
        response
    }
}

impl<T: Serialize> From<ConnectError> for ApiResponse<T> {
    fn from(err: ConnectError) -> Self {
        Self::from_error(&err)
    }
}

impl<T: Serialize> From<JsonRejection> for ApiResponse<T> {
    fn from(rejection: JsonRejection) -> Self {
        Self::error("BAD_REQUEST", "Invalid request body", vec![rejection.body_text()])
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "SUCCESS" => StatusCode::OK,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            "BAD_GATEWAY" => StatusCode::BAD_GATEWAY,
            "UNAVAILABLE" => StatusCode::SERVICE_UNAVAILABLE,
            "INTERNAL_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}
