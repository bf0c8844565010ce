use axum::{
    extract::{Query, State},
    Form,
};
use common::connector::authenticate_webhook;
use serde::Serialize;
use std::collections::HashMap;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

/// Parameters carrying the webhook credentials handed to every script
pub const PARAM_NAME: &str = "name";
pub const PARAM_API_KEY: &str = "apikey";

#[derive(Debug, Serialize)]
pub struct LogCreated {
    pub id: String,
}

/// Log webhook called by the export scripts, parameters in the query string
#[tracing::instrument(skip(state, params))]
pub async fn log_from_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<SuccessResponse<LogCreated>, ErrorResponse> {
    write_log(&state, params).await
}

/// Log webhook with form encoded parameters
#[tracing::instrument(skip(state, params))]
pub async fn log_from_form(
    State(state): State<AppState>,
    Form(params): Form<HashMap<String, String>>,
) -> Result<SuccessResponse<LogCreated>, ErrorResponse> {
    write_log(&state, params).await
}

async fn write_log(
    state: &AppState,
    params: HashMap<String, String>,
) -> Result<SuccessResponse<LogCreated>, ErrorResponse> {
    let param = |name: &str| params.get(name).map(|v| v.trim()).unwrap_or_default();

    let result = async {
        authenticate_webhook(state.store.as_ref(), param(PARAM_NAME), param(PARAM_API_KEY)).await?;
        state.log_writer.write(&params).await
    }
    .await;

    match result {
        Ok(entry) => Ok(SuccessResponse::new(LogCreated { id: entry.id })),
        Err(err) => {
            tracing::warn!(error = %err, "Log webhook rejected");
            Err(ErrorResponse::from_connector(&err, state.messages.as_ref()).await)
        }
    }
}
