/// Comment handlers
use actix_web::{web, HttpRequest, HttpResponse};

use super::{redirect, FormResult};
use crate::error::Result;
use crate::middleware::{return_path, Viewer};
use crate::models::CommentForm;
use crate::AppState;

/// GET /{username}/{post_id}/comment
pub async fn comment_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<(String, i64)>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let (username, post_id) = path.into_inner();
    let view = state.comments.comment_form(&username, post_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// POST /{username}/{post_id}/comment - redirects to the post on success
pub async fn add_comment(
    state: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<(String, i64)>,
    req: HttpRequest,
    form: FormResult<CommentForm>,
) -> actix_web::Result<HttpResponse> {
    let acting = state
        .guard
        .require_user(viewer.user(), &return_path(&req))
        .await?;
    let form = form?;
    let (username, post_id) = path.into_inner();
    state
        .comments
        .add_comment(&acting, &username, post_id, &form)
        .await?;
    Ok(redirect(format!("/{}/{}/", username, post_id)))
}
