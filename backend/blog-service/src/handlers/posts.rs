/// Post handlers - create and edit
use actix_web::{web, HttpRequest, HttpResponse};

use super::{redirect, FormResult};
use crate::error::Result;
use crate::middleware::{return_path, Viewer};
use crate::models::PostForm;
use crate::AppState;

/// GET /new/
pub async fn new_post_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    req: HttpRequest,
) -> Result<HttpResponse> {
    state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let view = state.posts.new_post_form().await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /new/ - redirects to the global feed on success
pub async fn create_post(
    state: web::Data<AppState>,
    viewer: Viewer,
    req: HttpRequest,
    form: FormResult<PostForm>,
) -> actix_web::Result<HttpResponse> {
    let author = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let form = form?;
    state.posts.create_post(&author, &form).await?;
    Ok(redirect("/"))
}

/// GET /{username}/{post_id}/edit/
pub async fn edit_post_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<(String, i64)>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let acting = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let (username, post_id) = path.into_inner();
    let view = state
        .posts
        .edit_post_form(&acting, &username, post_id)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /{username}/{post_id}/edit/ - redirects to the post on success
pub async fn update_post(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<(String, i64)>,
    req: HttpRequest,
    form: FormResult<PostForm>,
) -> actix_web::Result<HttpResponse> {
    let acting = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let form = form?;
    let (username, post_id) = path.into_inner();
    let post = state
        .posts
        .update_post(&acting, &username, post_id, &form)
        .await?;
    Ok(redirect(post.detail_url()))
}
