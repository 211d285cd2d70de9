//! Error responses
//!
//! Every failure is rendered as `{ "error": <stable code>, "message": <text> }` so a
//! front end can show a precise message for each rejected gesture. Requests that
//! cannot even be decoded use the same shape.

use crate::error::{EditError, FlowError, GraphError};
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Flow(FlowError),
    Edit(EditError),
    /// A submitted graph document breaks a structural rule
    Graph(GraphError),
    Path(PathRejection),
    Query(QueryRejection),
    Body(JsonRejection),
}

impl From<FlowError> for ApiError {
    fn from(error: FlowError) -> Self {
        Self::Flow(error)
    }
}

impl From<EditError> for ApiError {
    fn from(error: EditError) -> Self {
        Self::Edit(error)
    }
}

impl From<GraphError> for ApiError {
    fn from(error: GraphError) -> Self {
        Self::Graph(error)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Path(rejection)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Query(rejection)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Edit(_) | ApiError::Graph(_) => StatusCode::BAD_REQUEST,
            ApiError::Flow(FlowError::EmptyName) => StatusCode::BAD_REQUEST,
            ApiError::Flow(FlowError::FlowNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Flow(FlowError::InvalidTransition { .. } | FlowError::FlowImmutable(_)) => {
                StatusCode::CONFLICT
            }
            ApiError::Flow(FlowError::Persistence(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Path(rejection) => rejection.status(),
            ApiError::Query(rejection) => rejection.status(),
            ApiError::Body(rejection) => rejection.status(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Flow(error) => error.code(),
            ApiError::Edit(error) => error.code(),
            ApiError::Graph(error) => error.code(),
            ApiError::Path(_) => "invalid_path",
            ApiError::Query(_) => "invalid_query",
            ApiError::Body(_) => "invalid_body",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Flow(error) => error.to_string(),
            ApiError::Edit(error) => error.to_string(),
            ApiError::Graph(error) => error.to_string(),
            ApiError::Path(rejection) => rejection.body_text(),
            ApiError::Query(rejection) => rejection.body_text(),
            ApiError::Body(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.code(), message);
        }

        (status, Json(json!({ "error": self.code(), "message": message }))).into_response()
    }
}
