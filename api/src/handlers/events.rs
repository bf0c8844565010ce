use axum::{extract::State, http::StatusCode, Json};
use common::validation::EntityEvent;

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Check a persistence event against the registered validators
#[tracing::instrument(skip(state, event), fields(entity = %event.entity, kind = ?event.kind))]
pub async fn validate_event(
    State(state): State<AppState>,
    Json(event): Json<EntityEvent>,
) -> Result<StatusCode, ErrorResponse> {
    match state.validators.dispatch(&event) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(err) => {
            tracing::info!(key = err.message_key(), "Persistence event rejected");
            Err(ErrorResponse::from_connector(&err, state.messages.as_ref()).await)
        }
    }
}
