//! flaskr server library logic.

pub mod api;
pub mod api_auth;
pub mod api_blog;
pub mod cli;
pub mod config;
pub mod middleware;
pub mod session;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use config::Config;
use flaskr_db::{DbSettings, RequestContext};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Where each request context opens its connection.
    pub db: DbSettings,
    /// Testing mode: internal error details are not masked.
    pub testing: bool,
    /// Key used to sign session cookies.
    pub secret_key: String,
}

impl AppState {
    /// Builds the state from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            db: config.database.settings(),
            testing: config.testing,
            secret_key: config.secret_key.clone(),
        }
    }

    /// Starts a new request context against the configured store.
    pub fn new_context(&self) -> RequestContext {
        RequestContext::new(self.db.clone())
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(api_auth::register_handler))
        .route("/login", post(api_auth::login_handler))
        .route("/logout", get(api_auth::logout_handler));

    Router::new()
        .route("/health", get(api::health))
        .nest("/auth", auth_routes)
        .route("/", get(api_blog::index_handler))
        .route("/create", post(api_blog::create_handler))
        .route("/{id}", get(api_blog::get_post_handler))
        .route("/{id}/update", post(api_blog::update_handler))
        .route("/{id}/delete", post(api_blog::delete_handler))
        .layer(axum::middleware::from_fn(middleware::load_logged_in_user))
        .layer(axum::middleware::from_fn(
            middleware::request_context_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::mask_internal_errors))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
