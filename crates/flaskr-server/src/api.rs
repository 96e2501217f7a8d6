//! Shared handler plumbing: the API error type, redirects, and running
//! database work against the request's context.

use axum::{
    extract::Json,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use flaskr_blog::{BlogError, User};
use flaskr_db::{get_db, RequestContext};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("login required")]
    LoginRequired,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::LoginRequired => return found("/auth/login"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalServerError(msg) => {
                tracing::error!("request failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<BlogError> for ApiError {
    fn from(e: BlogError) -> Self {
        match e {
            BlogError::Db(_) | BlogError::MacKey => ApiError::InternalServerError(e.to_string()),
            BlogError::PostNotFound(_) => ApiError::NotFound(e.to_string()),
            BlogError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            BlogError::Invalid(_)
            | BlogError::AlreadyRegistered(_)
            | BlogError::IncorrectUsername
            | BlogError::IncorrectPassword => ApiError::BadRequest(e.to_string()),
        }
    }
}

/// `302 Found` redirect to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Returns the logged-in user or redirects to the login page.
pub fn require_login(user: Option<User>) -> Result<User, ApiError> {
    user.ok_or(ApiError::LoginRequired)
}

/// Runs `f` on the request's connection in a blocking task.
///
/// The connection is opened on first use and shared by every call in the
/// same request.
pub async fn with_db<T, F>(ctx: Arc<RequestContext>, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Connection) -> Result<T, BlogError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let db = get_db(&ctx).map_err(BlogError::from)?;
        db.with_conn(f)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
    .map_err(ApiError::from)
}

/// Health check handler.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
