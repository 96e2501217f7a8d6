use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use flaskr_blog::User;
use flaskr_db::RequestContext;
use std::sync::Arc;

use crate::{api, session, AppState};

/// The user loaded from the session cookie, if any.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Option<User>);

/// Error indicator handed to the teardown hook when a request fails.
#[derive(Debug, thiserror::Error)]
#[error("request failed with status {0}")]
pub struct RequestFailed(pub StatusCode);

fn app_state(req: &Request<Body>) -> Result<Arc<AppState>, StatusCode> {
    req.extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Gives every request its own [`RequestContext`].
///
/// The context goes into request extensions for handlers to share; once the
/// response is produced the teardown hook closes whatever connection the
/// request opened.
pub async fn request_context_middleware(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let state = app_state(&req)?;
    let ctx = Arc::new(state.new_context());
    req.extensions_mut().insert(Arc::clone(&ctx));

    let response = next.run(req).await;

    let status = response.status();
    tokio::task::spawn_blocking(move || {
        if status.is_server_error() {
            ctx.teardown(Some(&RequestFailed(status)));
        } else {
            ctx.teardown(None);
        }
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(response)
}

/// Loads the logged-in user from the session cookie into [`CurrentUser`].
///
/// Must run inside [`request_context_middleware`]. Anonymous requests never
/// touch the database.
pub async fn load_logged_in_user(
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let state = app_state(&req)?;
    let ctx = req
        .extensions()
        .get::<Arc<RequestContext>>()
        .cloned()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = match session::read_session(req.headers(), &state.secret_key) {
        Some(user_id) => api::with_db(ctx, move |conn| flaskr_blog::get_user(conn, user_id))
            .await
            .map_err(|e| {
                tracing::error!("failed to load session user: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?,
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Replaces 5xx bodies with a generic message unless testing mode is on.
pub async fn mask_internal_errors(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let state = app_state(&req)?;
    let response = next.run(req).await;

    if state.testing || !response.status().is_server_error() {
        return Ok(response);
    }

    let status = response.status();
    Ok((
        status,
        Json(serde_json::json!({ "error": "internal server error" })),
    )
        .into_response())
}
