//! Post listing and editing.
//!
//! Reads are public; writes need a session and, for existing posts, must
//! come from the post's author.

use crate::{
    api::{found, require_login, with_db, ApiError},
    middleware::CurrentUser,
};
use axum::{
    extract::{Extension, Form, Path},
    response::Response,
    Json,
};
use flaskr_blog::{Post, PostForm};
use flaskr_db::RequestContext;
use std::sync::Arc;

/// Handler for `GET /`.
pub async fn index_handler(
    Extension(ctx): Extension<Arc<RequestContext>>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = with_db(ctx, flaskr_blog::list_posts).await?;
    Ok(Json(posts))
}

/// Handler for `GET /{id}`.
pub async fn get_post_handler(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ApiError> {
    let post = with_db(ctx, move |conn| flaskr_blog::get_post(conn, id, None)).await?;
    Ok(Json(post))
}

/// Handler for `POST /create`.
pub async fn create_handler(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<PostForm>,
) -> Result<Response, ApiError> {
    let user = require_login(user)?;
    with_db(ctx, move |conn| flaskr_blog::create_post(conn, user.id, &form)).await?;
    Ok(found("/"))
}

/// Handler for `POST /{id}/update`.
pub async fn update_handler(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Response, ApiError> {
    let user = require_login(user)?;
    with_db(ctx, move |conn| {
        flaskr_blog::get_post(conn, id, Some(user.id))?;
        flaskr_blog::update_post(conn, id, &form)
    })
    .await?;
    Ok(found("/"))
}

/// Handler for `POST /{id}/delete`.
pub async fn delete_handler(
    Extension(ctx): Extension<Arc<RequestContext>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let user = require_login(user)?;
    with_db(ctx, move |conn| {
        flaskr_blog::get_post(conn, id, Some(user.id))?;
        flaskr_blog::delete_post(conn, id)
    })
    .await?;
    Ok(found("/"))
}
