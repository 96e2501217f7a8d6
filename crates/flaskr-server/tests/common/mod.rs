#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use flaskr_db::{get_db, init_db, DbSettings, RequestContext};
use flaskr_server::{app, config::Config, AppState};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Seed users `test`/`test` and `other`/`other`, plus one post by `test`.
pub const DATA_SQL: &str = include_str!("../data.sql");

pub struct TestApp {
    pub router: Router,
    pub config: Config,
    // Keeps the database file alive for the duration of the test.
    _dir: TempDir,
}

impl TestApp {
    pub fn settings(&self) -> DbSettings {
        self.config.database.settings()
    }

    /// Opens a fresh context against the test database.
    pub fn context(&self) -> RequestContext {
        RequestContext::new(self.settings())
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(get(uri, cookie)).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(post_form(uri, body, cookie)).await
    }

    /// Logs in and returns the session cookie pair (`session=...`).
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post_form(
                "/auth/login",
                &format!("username={username}&password={password}"),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::FOUND, "login should redirect");
        session_cookie(&response).expect("login should set a session cookie")
    }

    pub fn count(&self, sql: &str) -> i64 {
        let ctx = self.context();
        let count: Option<i64> = get_db(&ctx)
            .unwrap()
            .query_opt(sql, [])
            .unwrap();
        count.unwrap_or(0)
    }
}

/// Builds an app over a temporary database with schema and seed data.
pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flaskr.sqlite");
    let config = Config::for_testing(path.to_string_lossy());

    let ctx = RequestContext::new(config.database.settings());
    init_db(&ctx).unwrap();
    get_db(&ctx).unwrap().execute_batch(DATA_SQL).unwrap();
    ctx.teardown(None);

    TestApp {
        router: app(AppState::from_config(&config)),
        config,
        _dir: dir,
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// The `session=...` pair from a `Set-Cookie` header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .find(|pair| pair.starts_with("session="))
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
