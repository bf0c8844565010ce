use axum::{extract::State, Json};
use common::connector::SyncReport;
use common::models::RequestContext;
use serde::Deserialize;

use crate::handlers::{ErrorResponse, SuccessResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub client_id: String,
    pub organization_id: String,
}

/// Run the sync process for a client and organization
#[tracing::instrument(skip(state))]
pub async fn run_sync(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<SuccessResponse<SyncReport>, ErrorResponse> {
    let ctx = RequestContext::new(request.client_id, request.organization_id);
    let report = state.sync.run(&ctx).await?;

    tracing::info!(
        connection_id = %report.connection_id,
        launched = report.launched.len(),
        "Sync process completed"
    );
    Ok(SuccessResponse::new(report))
}
