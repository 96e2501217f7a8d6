//! Registration, login and logout.

use crate::{
    api::{found, with_db, ApiError},
    session, AppState,
};
use axum::{
    extract::{Extension, Form},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use flaskr_db::RequestContext;
use serde::Deserialize;
use std::sync::Arc;

/// Form body for registration and login.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Handler for `POST /auth/register`.
pub async fn register_handler(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    with_db(ctx, move |conn| {
        flaskr_blog::register_user(conn, &form.username, &form.password)
    })
    .await?;
    Ok(found("/auth/login"))
}

/// Handler for `POST /auth/login`.
///
/// On success, sets the session cookie and redirects to the index.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(ctx): Extension<Arc<RequestContext>>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, ApiError> {
    let user = with_db(ctx, move |conn| {
        flaskr_blog::authenticate(conn, &form.username, &form.password)
    })
    .await?;

    let cookie = session::session_cookie(&state.secret_key, user.id)?;
    tracing::info!(user_id = user.id, "user logged in");

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response())
}

/// Handler for `GET /auth/logout`.
pub async fn logout_handler() -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, session::clear_session_cookie()),
        ],
    )
        .into_response()
}
