use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use common::connector::authenticate_webhook;

use crate::handlers::ErrorResponse;
use crate::state::AppState;

pub const WEBHOOK_NAME_HEADER: &str = "x-webhook-name";
pub const API_KEY_HEADER: &str = "x-api-key";

/// Require a webhook name and API key pair on the request headers
///
/// The pair is checked against the webhook access grants, the same
/// credentials the export scripts receive.
#[tracing::instrument(skip(state, req, next))]
pub async fn webhook_auth_middleware(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let (name, api_key) = {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        (header(WEBHOOK_NAME_HEADER), header(API_KEY_HEADER))
    };

    if let Err(err) = authenticate_webhook(state.store.as_ref(), &name, &api_key).await {
        return Err(ErrorResponse::from_connector(&err, state.messages.as_ref()).await);
    }

    Ok(next.run(req).await)
}
