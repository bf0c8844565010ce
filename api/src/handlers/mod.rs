pub mod events;
pub mod health;
pub mod metrics;
pub mod processes;
pub mod webhooks;

// Common response types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::errors::{ConnectorError, ProcessError, INTERNAL_ERROR_KEY, UNAUTHORIZED_KEY};
use common::messages::MessageResolver;
use serde::Serialize;

const VALIDATION_KEYS: [&str; 3] = [
    "ETPBIC_InvalidQuerySyntax",
    "ETPBIC_InvalidDelimiter",
    "ETPBIC_CantDeleteEtendoQuery",
];

/// HTTP status for a message key
///
/// Rejected input is a client error and rejected webhook credentials are
/// unauthorized. Internal faults are server errors. Everything else is
/// configuration or data the request could not be served with.
pub fn status_for_key(key: &str) -> StatusCode {
    if VALIDATION_KEYS.iter().any(|k| *k == key) {
        StatusCode::BAD_REQUEST
    } else if key == UNAUTHORIZED_KEY {
        StatusCode::UNAUTHORIZED
    } else if key == INTERNAL_ERROR_KEY {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Resolve a connector error through the message catalogue
    pub async fn from_connector(err: &ConnectorError, messages: &dyn MessageResolver) -> Self {
        ProcessError::resolve(err, messages).await.into()
    }
}

impl From<ProcessError> for ErrorResponse {
    fn from(err: ProcessError) -> Self {
        Self::new(err.key, err.message)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = status_for_key(&self.error);
        (status, Json(self)).into_response()
    }
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for_key("ETPBIC_InvalidDelimiter"), StatusCode::BAD_REQUEST);
        assert_eq!(status_for_key("ETPBIC_NullConfigError"), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for_key("ETPBIC_ScriptNotFound"), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for_key(UNAUTHORIZED_KEY), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_for_key(INTERNAL_ERROR_KEY),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
